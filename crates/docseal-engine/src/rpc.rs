//! Ledger calls through the retry wrapper.
//!
//! Reads are retried while they fail transiently. Writes are submitted
//! once and then polled until the transaction is confirmed, reverted, or
//! the budget runs out. An accepted transaction is never resubmitted.
//!
//! A transient submission failure may still have been accepted: the
//! gateway applied the write and the response was lost. Before every
//! resubmission the caller's `applied` check reads the ledger, and when the
//! write's effect is already there the submission loop stops.

use std::future::Future;

use docseal_client::{with_retry_if, RetryPolicy};
use docseal_core::{Ledger, LedgerError, TxHash, TxStatus};

/// Run an idempotent ledger read with retries.
pub(crate) async fn read<T, F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> Result<T, LedgerError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    with_retry_if(policy, operation, f, LedgerError::is_transient).await
}

/// Submit a write and wait for its confirmation.
///
/// Returns `None` when the write was found on the ledger after its
/// submission receipt was lost. The transaction hash is unknown then.
pub(crate) async fn submit_and_confirm<F, Fut, A, AFut>(
    ledger: &dyn Ledger,
    policy: &RetryPolicy,
    operation: &str,
    submit: F,
    applied: A,
) -> Result<Option<TxHash>, LedgerError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<TxHash, LedgerError>>,
    A: Fn() -> AFut,
    AFut: Future<Output = Result<bool, LedgerError>>,
{
    let max_attempts = policy.attempts();
    let mut delays = policy.delays();
    let mut uncertain = false;
    let mut attempt = 1u32;

    let tx = loop {
        match submit().await {
            Ok(tx) => break tx,
            Err(e) => {
                // After a transient failure a later rejection may be our own
                // earlier write colliding with itself.
                if (uncertain || e.is_transient()) && read(policy, operation, &applied).await? {
                    tracing::info!(operation, attempt, "write found on ledger, submission receipt was lost");
                    return Ok(None);
                }
                if !e.is_transient() {
                    return Err(e);
                }
                let Some(delay) = delays.next() else {
                    return Err(e);
                };
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    "submission failed, retrying in {delay:?}: {e}"
                );
                uncertain = true;
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    };
    tracing::debug!(operation, tx = %tx, "transaction submitted");

    let tx_ref = &tx;
    with_retry_if(
        policy,
        operation,
        || async move {
            match ledger.transaction_status(tx_ref).await? {
                TxStatus::Confirmed => Ok(()),
                TxStatus::Pending => Err(LedgerError::transient(
                    operation,
                    format!("transaction {tx_ref} not confirmed"),
                )),
                TxStatus::Reverted { reason } => Err(LedgerError::rejected(operation, reason)),
            }
        },
        LedgerError::is_transient,
    )
    .await?;

    tracing::info!(operation, tx = %tx, "transaction confirmed");
    Ok(Some(tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use docseal_core::Address;
    use docseal_ledger_stub::MemoryLedger;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(Address::new("0x00000000000000000000000000000000000000aa").unwrap())
    }

    #[tokio::test]
    async fn confirms_after_pending_polls() {
        let ledger = ledger();
        ledger.book().set_confirmation_polls(2);
        let l = &ledger;
        let tx = submit_and_confirm(l, &policy(), "registerUser", || async move {
            l.submit_register_user("Alice").await
        }, || async move { l.is_user().await })
        .await
        .unwrap();
        assert!(tx.unwrap().as_str().starts_with("0x"));
        assert!(ledger.is_user().await.unwrap());
    }

    #[tokio::test]
    async fn unconfirmed_after_budget_is_transient() {
        let ledger = ledger();
        ledger.book().set_confirmation_polls(5);
        let l = &ledger;
        let err = submit_and_confirm(l, &policy(), "registerUser", || async move {
            l.submit_register_user("Alice").await
        }, || async move { l.is_user().await })
        .await
        .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("not confirmed"));
    }

    #[tokio::test]
    async fn reverted_transaction_is_rejected_without_resubmission() {
        let ledger = ledger();
        ledger.book().revert_next_submissions(1);
        let l = &ledger;
        let err = submit_and_confirm(l, &policy(), "registerUser", || async move {
            l.submit_register_user("Alice").await
        }, || async move { l.is_user().await })
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
        assert!(!ledger.is_registered().await.unwrap());
    }

    #[tokio::test]
    async fn rejected_submission_is_not_retried() {
        let ledger = ledger();
        let l = &ledger;
        ledger.submit_register_user("Alice").await.unwrap();
        let err = submit_and_confirm(l, &policy(), "registerUser", || async move {
            l.submit_register_user("Alice again").await
        }, never_applied)
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
    }

    async fn never_applied() -> Result<bool, LedgerError> {
        Ok(false)
    }

    #[tokio::test]
    async fn lost_receipt_is_resolved_by_reading_the_ledger() {
        let ledger = ledger();
        ledger.book().lose_next_receipts(1);
        let l = &ledger;
        let submissions = std::sync::atomic::AtomicU32::new(0);
        let s = &submissions;
        let tx = submit_and_confirm(l, &policy(), "registerUser", || async move {
            s.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            l.submit_register_user("Alice").await
        }, || async move { l.is_user().await })
        .await
        .unwrap();
        assert_eq!(tx, None);
        assert_eq!(submissions.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(ledger.get_profile().await.unwrap().unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn transient_failure_without_effect_is_resubmitted() {
        let ledger = ledger();
        ledger.book().fail_next_calls(1);
        let l = &ledger;
        let tx = submit_and_confirm(l, &policy(), "registerUser", || async move {
            l.submit_register_user("Alice").await
        }, || async move { l.is_user().await })
        .await
        .unwrap();
        assert!(tx.is_some());
        assert!(ledger.is_user().await.unwrap());
    }

    #[tokio::test]
    async fn reads_absorb_transient_faults() {
        let ledger = ledger();
        ledger.book().fail_next_calls(2);
        let l = &ledger;
        let status = read(&policy(), "accountStatus", || async move { l.account_status().await })
            .await
            .unwrap();
        assert!(!status.registered);

        ledger.book().fail_next_calls(3);
        let err = read(&policy(), "accountStatus", || async move { l.account_status().await })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
