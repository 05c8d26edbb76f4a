use std::sync::Arc;

use ethers::types::Address;

use crate::contracts::CredentialLedger;

/// The connected wallet: the active account and a contract client bound to
/// it. Either may be absent while the wallet is not connected.
#[derive(Clone, Default)]
pub struct WalletContext {
    account: Option<Address>,
    ledger: Option<Arc<dyn CredentialLedger>>,
}

impl WalletContext {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(account: Address, ledger: Arc<dyn CredentialLedger>) -> Self {
        Self {
            account: Some(account),
            ledger: Some(ledger),
        }
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn CredentialLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn disconnect(&mut self) {
        self.account = None;
        self.ledger = None;
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn ledger(&self) -> Option<&Arc<dyn CredentialLedger>> {
        self.ledger.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some() && self.ledger.is_some()
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("account", &self.account)
            .field("ledger", &self.ledger.is_some())
            .finish()
    }
}
