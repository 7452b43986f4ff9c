//! Transfer engine: one transfer, one unit of work.

use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{TransferError, TransferResult};
use super::phase::TransferPhase;
use crate::db::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use crate::ledger::{LedgerStore, StoreError, TransferReceipt, TransferRequest, UnitOfWork};
use crate::lookup::resolve_within;

/// Fractional digits a transfer amount may carry (matches `NUMERIC(20, 2)`)
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Orchestrates validation, balance mutation and record insertion
pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: LedgerStore> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

fn storage(phase: TransferPhase) -> impl FnOnce(StoreError) -> TransferError {
    move |source| TransferError::Storage { phase, source }
}

fn advance(phase: &mut TransferPhase) {
    let next = phase.next();
    debug!("Transfer phase {phase} -> {next}");
    *phase = next;
}

/// Reject non-positive amounts and amounts finer than cents
pub fn validate_amount(amount: Decimal) -> TransferResult<()> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(TransferError::InvalidAmount(amount));
    }
    Ok(())
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Create a new transfer engine
    ///
    /// # Arguments
    ///
    /// * `store` - Ledger store shared with the other services
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    /// Override the deadline for staging a transfer
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Move `amount` from one wallet to another
    ///
    /// Address resolution, the balance check, both balance updates and the
    /// record insert all run in a single unit of work. Any failure before
    /// commit rolls the unit back before the error is returned.
    ///
    /// The deadline covers everything up to commit. Commit runs to completion
    /// under the store's own statement timeout, so a `Timeout` always means
    /// the unit was rolled back.
    ///
    /// # Errors
    ///
    /// * `TransferError::InvalidAmount` - Amount not positive or too precise
    /// * `TransferError::WalletNotFound` - Sender or receiver unknown
    /// * `TransferError::InsufficientBalance` - Sender balance below amount
    /// * `TransferError::Storage` - Store failure, tagged with its phase
    /// * `TransferError::Timeout` - Deadline passed before commit; the unit was rolled back
    pub async fn transfer(&self, request: &TransferRequest) -> TransferResult<TransferReceipt> {
        validate_amount(request.amount)?;

        let mut phase = TransferPhase::Validating;
        let staged = tokio::time::timeout(self.timeout, self.stage(request, &mut phase)).await;

        let (unit, receipt) = match staged {
            Ok(Ok(staged)) => staged,
            Ok(Err(err)) => {
                debug!("Transfer phase {phase} -> {}: {err}", phase.abort());
                return Err(err);
            }
            // The dropped future took its unit of work with it, which rolls back
            Err(_) => {
                warn!(
                    "Transfer {} -> {} timed out while {phase} after {:?}",
                    request.sender_address, request.receiver_address, self.timeout
                );
                return Err(TransferError::Timeout {
                    phase,
                    after: self.timeout,
                });
            }
        };

        advance(&mut phase);
        if let Err(source) = unit.commit().await {
            warn!(
                "Commit of transfer {} -> {} failed: {source}",
                request.sender_address, request.receiver_address
            );
            return Err(TransferError::Storage { phase, source });
        }
        advance(&mut phase);

        info!(
            "Transfer #{} committed: {} -> {} amount {}",
            receipt.transaction_id, receipt.sender_address, receipt.receiver_address, receipt.amount
        );
        Ok(receipt)
    }

    /// Open a unit of work and apply every write, leaving only the commit
    async fn stage(
        &self,
        request: &TransferRequest,
        phase: &mut TransferPhase,
    ) -> TransferResult<(S::Unit, TransferReceipt)> {
        let mut unit = self.store.begin().await.map_err(storage(*phase))?;

        match Self::apply(&mut unit, request, phase).await {
            Ok(receipt) => Ok((unit, receipt)),
            Err(err) => {
                if let Err(rollback_err) = unit.rollback().await {
                    warn!("Rollback after failure while {phase} did not complete: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    async fn apply(
        unit: &mut S::Unit,
        request: &TransferRequest,
        phase: &mut TransferPhase,
    ) -> TransferResult<TransferReceipt> {
        let amount = request.amount;

        let sender = resolve_within(unit, &request.sender_address)
            .await
            .map_err(|e| TransferError::from_lookup(*phase, e))?;
        let receiver = resolve_within(unit, &request.receiver_address)
            .await
            .map_err(|e| TransferError::from_lookup(*phase, e))?;

        advance(phase);
        let locked = unit
            .lock_balances(&[sender, receiver])
            .await
            .map_err(storage(*phase))?;
        let available = locked
            .iter()
            .find(|(id, _)| *id == sender)
            .map(|(_, balance)| *balance)
            .ok_or_else(|| TransferError::WalletNotFound(request.sender_address.clone()))?;
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        advance(phase);
        let debited = unit
            .adjust_balance(sender, -amount)
            .await
            .map_err(storage(*phase))?
            .ok_or(TransferError::InsufficientBalance {
                available,
                required: amount,
            })?;
        let credited = unit
            .adjust_balance(receiver, amount)
            .await
            .map_err(storage(*phase))?
            .ok_or_else(|| TransferError::WalletNotFound(request.receiver_address.clone()))?;
        // A self-transfer nets out; the credit carries the final balance
        let sender_balance = if sender == receiver { credited } else { debited };

        advance(phase);
        let stamp = unit
            .insert_record(sender, receiver, amount)
            .await
            .map_err(storage(*phase))?;

        Ok(TransferReceipt {
            transaction_id: stamp.id,
            sender_address: request.sender_address.clone(),
            receiver_address: request.receiver_address.clone(),
            amount,
            sender_balance,
            receiver_balance: credited,
            created_at: stamp.created_at,
        })
    }
}
