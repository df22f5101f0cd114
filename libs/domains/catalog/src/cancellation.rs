use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

/// Drive `work` until it finishes or `token` fires.
///
/// A token that already fired wins before `work` is polled. Dropping `work`
/// drops any transaction it holds, which rolls it back.
pub(crate) async fn cancellable<T>(
    token: &CancellationToken,
    operation: &'static str,
    work: impl Future<Output = CatalogResult<T>>,
) -> CatalogResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            warn!(operation, "Catalog operation cancelled");
            Err(CatalogError::Cancelled { operation })
        }
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_fired_token_skips_work() {
        let token = CancellationToken::new();
        token.cancel();

        let ran = AtomicBool::new(false);
        let err = cancellable(&token, "get_all", async {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_idle_token_returns_work_result() {
        let token = CancellationToken::new();
        let value = cancellable(&token, "get_all", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_token_fired_mid_flight() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let err = cancellable(&token, "update", async move {
            trigger.cancel();
            std::future::pending::<CatalogResult<()>>().await
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CatalogError::Cancelled { operation: "update" }));
    }
}
