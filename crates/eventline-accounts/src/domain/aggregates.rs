//! Aggregate snapshot and business rules for the Accounts context.

use std::sync::Arc;

use eventline_core::envelope::Command;
use eventline_core::error::DomainError;
use eventline_core::store::{Snapshot, SnapshotStore};
use eventline_runtime::{EventQueue, Outcome, Saga, SagaBehavior};

use super::commands::{AccountCommand, CloseAccount, CreateAccount, Deposit, Withdraw};
use super::events::{AccountClosed, AccountCreated, AccountEvent, FundsDeposited, FundsWithdrawn};

/// Latest state of one account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    /// Account identifier (the entity id).
    pub id: Option<i64>,
    /// Sequence number of the last command applied.
    pub version: i64,
    /// Name of the account holder.
    pub holder: String,
    /// Balance in cents.
    pub balance: i64,
    /// Whether the account has been closed.
    pub is_closed: bool,
}

impl Snapshot for Account {
    const KIND: &'static str = "account";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Business rules for accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSaga;

impl AccountSaga {
    /// Binds the rules to a snapshot store and event queue, subscribed to
    /// every account command.
    #[must_use]
    pub fn saga(
        accounts: Arc<dyn SnapshotStore<Account>>,
        events: EventQueue<AccountEvent>,
    ) -> Saga<Self, AccountCommand, AccountEvent> {
        Saga::new(Self, accounts, events)
            .subscribe::<CreateAccount>()
            .subscribe::<Deposit>()
            .subscribe::<Withdraw>()
            .subscribe::<CloseAccount>()
    }
}

fn require_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::RuleViolation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// The stored account, provided it exists and is still open.
fn open_account(current: Option<&Account>, entity_id: i64) -> Result<&Account, DomainError> {
    let account = current.ok_or(DomainError::NotFound {
        kind: Account::KIND,
        id: entity_id,
    })?;
    if account.is_closed {
        return Err(DomainError::RuleViolation(format!(
            "account {entity_id} is closed"
        )));
    }
    Ok(account)
}

fn create(
    current: Option<&Account>,
    entity_id: i64,
    create: &CreateAccount,
) -> Result<Outcome<Account, AccountEvent>, DomainError> {
    if current.is_some() {
        return Err(DomainError::RuleViolation(format!(
            "account {entity_id} already exists"
        )));
    }
    if create.holder.trim().is_empty() {
        return Err(DomainError::RuleViolation(
            "account holder must not be blank".to_owned(),
        ));
    }
    if create.initial_balance < 0 {
        return Err(DomainError::RuleViolation(format!(
            "initial balance must not be negative, got {}",
            create.initial_balance
        )));
    }

    let account = Account {
        holder: create.holder.clone(),
        balance: create.initial_balance,
        ..Account::default()
    };
    Ok(Outcome::new(account).with_event(AccountEvent::Created(AccountCreated {
        holder: create.holder.clone(),
        initial_balance: create.initial_balance,
    })))
}

impl SagaBehavior<AccountCommand, AccountEvent> for AccountSaga {
    type Snapshot = Account;

    fn name(&self) -> &'static str {
        "account"
    }

    fn decide(
        &self,
        current: Option<&Account>,
        command: &Command<AccountCommand>,
    ) -> Result<Outcome<Account, AccountEvent>, DomainError> {
        let entity_id = command.entity.id();

        match &command.payload {
            AccountCommand::Create(payload) => create(current, entity_id, payload),
            AccountCommand::Deposit(deposit) => {
                let mut next = open_account(current, entity_id)?.clone();
                require_positive(deposit.amount)?;
                next.balance = next.balance.checked_add(deposit.amount).ok_or_else(|| {
                    DomainError::RuleViolation(format!(
                        "deposit of {} would exceed the balance limit of account {entity_id}",
                        deposit.amount
                    ))
                })?;
                let balance = next.balance;
                Ok(Outcome::new(next).with_event(AccountEvent::Deposited(FundsDeposited {
                    amount: deposit.amount,
                    balance,
                })))
            }
            AccountCommand::Withdraw(withdraw) => {
                let mut next = open_account(current, entity_id)?.clone();
                require_positive(withdraw.amount)?;
                if withdraw.amount > next.balance {
                    return Err(DomainError::RuleViolation(format!(
                        "insufficient funds in account {entity_id}: balance {}, requested {}",
                        next.balance, withdraw.amount
                    )));
                }
                next.balance -= withdraw.amount;
                let balance = next.balance;
                Ok(Outcome::new(next).with_event(AccountEvent::Withdrawn(FundsWithdrawn {
                    amount: withdraw.amount,
                    balance,
                })))
            }
            AccountCommand::Close(_) => {
                let mut next = open_account(current, entity_id)?.clone();
                next.is_closed = true;
                let final_balance = next.balance;
                Ok(Outcome::new(next)
                    .with_event(AccountEvent::Closed(AccountClosed { final_balance })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eventline_core::clock::Clock;
    use eventline_core::entity::EntityReference;
    use eventline_core::envelope::Envelope;
    use eventline_core::payload::Variant;

    use super::*;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        }
    }

    fn command<V: Variant<AccountCommand>>(payload: V) -> Command<AccountCommand> {
        Envelope::from_variant(EntityReference::existing(1), payload, &FixedClock)
    }

    fn account_with(balance: i64) -> Account {
        Account {
            id: Some(1),
            version: 1,
            holder: "Ann".into(),
            balance,
            is_closed: false,
        }
    }

    #[test]
    fn test_create_opens_account_with_initial_balance() {
        // Arrange
        let create = command(CreateAccount {
            holder: "Ann".into(),
            initial_balance: 1000,
        });

        // Act
        let outcome = AccountSaga.decide(None, &create).unwrap();

        // Assert
        assert_eq!(outcome.snapshot.holder, "Ann");
        assert_eq!(outcome.snapshot.balance, 1000);
        assert!(!outcome.snapshot.is_closed);
        assert_eq!(
            outcome.events,
            vec![AccountEvent::Created(AccountCreated {
                holder: "Ann".into(),
                initial_balance: 1000,
            })]
        );
    }

    #[test]
    fn test_create_rejects_existing_account() {
        let create = command(CreateAccount {
            holder: "Ann".into(),
            initial_balance: 0,
        });

        let result = AccountSaga.decide(Some(&account_with(0)), &create);

        match result {
            Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("already exists")),
            other => panic!("expected RuleViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_create_rejects_blank_holder_and_negative_balance() {
        let blank = command(CreateAccount {
            holder: " ".into(),
            initial_balance: 0,
        });
        let negative = command(CreateAccount {
            holder: "Ann".into(),
            initial_balance: -1,
        });

        assert!(AccountSaga.decide(None, &blank).unwrap_err().is_rule_violation());
        assert!(AccountSaga.decide(None, &negative).unwrap_err().is_rule_violation());
    }

    #[test]
    fn test_deposit_adds_to_balance() {
        let outcome = AccountSaga
            .decide(Some(&account_with(1000)), &command(Deposit { amount: 500 }))
            .unwrap();

        assert_eq!(outcome.snapshot.balance, 1500);
        assert_eq!(
            outcome.events,
            vec![AccountEvent::Deposited(FundsDeposited {
                amount: 500,
                balance: 1500,
            })]
        );
    }

    #[test]
    fn test_deposit_rejects_balance_overflow() {
        let result = AccountSaga.decide(Some(&account_with(1000)), &command(Deposit { amount: i64::MAX }));

        match result {
            Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("balance limit")),
            other => panic!("expected RuleViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_deposit_rejects_non_positive_amount() {
        for amount in [0, -5] {
            let result = AccountSaga.decide(Some(&account_with(1000)), &command(Deposit { amount }));

            match result {
                Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("positive")),
                other => panic!("expected RuleViolation, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_deposit_to_missing_account_returns_not_found() {
        let result = AccountSaga.decide(None, &command(Deposit { amount: 5 }));

        match result {
            Err(DomainError::NotFound { kind, id }) => {
                assert_eq!(kind, "account");
                assert_eq!(id, 1);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_withdraw_rejects_overdraft() {
        let result = AccountSaga.decide(Some(&account_with(100)), &command(Withdraw { amount: 101 }));

        match result {
            Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("insufficient funds")),
            other => panic!("expected RuleViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_withdraw_can_empty_account() {
        let outcome = AccountSaga
            .decide(Some(&account_with(100)), &command(Withdraw { amount: 100 }))
            .unwrap();

        assert_eq!(outcome.snapshot.balance, 0);
    }

    #[test]
    fn test_close_marks_account_closed() {
        let outcome = AccountSaga
            .decide(Some(&account_with(300)), &command(CloseAccount))
            .unwrap();

        assert!(outcome.snapshot.is_closed);
        assert_eq!(
            outcome.events,
            vec![AccountEvent::Closed(AccountClosed { final_balance: 300 })]
        );
    }

    #[test]
    fn test_closed_account_rejects_everything() {
        let mut closed = account_with(300);
        closed.is_closed = true;

        for cmd in [
            command(Deposit { amount: 1 }),
            command(Withdraw { amount: 1 }),
            command(CloseAccount),
        ] {
            let result = AccountSaga.decide(Some(&closed), &cmd);

            match result {
                Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("is closed")),
                other => panic!("expected RuleViolation, got {other:?}"),
            }
        }
    }
}
