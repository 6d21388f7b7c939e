// Settlement edge cases
// Arithmetic limits, empty transactions, and intra-transaction ordering

use lockmint::identity::Keypair;
use lockmint::settlement::{
    AccountId, AccountState, AccountUpdateBuilder, LocalChain, SettlementError, Transaction,
};

// ============================================================================
// ARITHMETIC LIMITS
// ============================================================================

/// Test: a fresh account can be credited up to u64::MAX
#[test]
fn test_balance_can_reach_u64_max() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());

    let update = AccountUpdateBuilder::new(id.clone())
        .require_new()
        .credit(u64::MAX)
        .build()
        .authorize_signature(&keypair);
    chain.apply(&Transaction::single(update)).unwrap();

    assert_eq!(chain.balance(&id), u64::MAX);
}

/// Test: crediting past u64::MAX rejects the transaction
#[test]
fn test_balance_overflow_is_rejected() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());
    chain.fund(&keypair.public_key(), 1);

    let update = AccountUpdateBuilder::new(id.clone())
        .credit(u64::MAX)
        .build();
    let result = chain.apply(&Transaction::single(update));

    assert!(matches!(result, Err(SettlementError::BalanceOverflow(_))));
    assert_eq!(chain.balance(&id), 1);
}

/// Test: a credit and a debit in one update net out
#[test]
fn test_credit_and_debit_in_one_update() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());
    chain.fund(&keypair.public_key(), 10);

    let update = AccountUpdateBuilder::new(id.clone())
        .credit(50)
        .debit(30)
        .build()
        .authorize_signature(&keypair);
    chain.apply(&Transaction::single(update)).unwrap();

    assert_eq!(chain.balance(&id), 30);
}

/// Test: the credit is available to the debit within the same update
#[test]
fn test_debit_may_spend_the_same_updates_credit() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());
    chain.fund(&keypair.public_key(), 0);

    let update = AccountUpdateBuilder::new(id.clone())
        .credit(40)
        .debit(40)
        .build()
        .authorize_signature(&keypair);
    chain.apply(&Transaction::single(update)).unwrap();

    assert_eq!(chain.balance(&id), 0);
}

// ============================================================================
// DEGENERATE SHAPES
// ============================================================================

/// Test: an empty transaction commits and advances the height
#[test]
fn test_empty_transaction_advances_height() {
    let mut chain = LocalChain::new();

    chain.apply(&Transaction::new(Vec::new())).unwrap();

    assert_eq!(chain.height(), 1);
    assert_eq!(chain.account_count(), 0);
}

/// Test: a value precondition on a nonexistent account is rejected
#[test]
fn test_value_precondition_on_nonexistent_account() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();

    let update = AccountUpdateBuilder::new(AccountId::base(keypair.public_key()))
        .require_new()
        .require_balance_at_least(1)
        .build()
        .authorize_signature(&keypair);
    let result = chain.apply(&Transaction::single(update));

    assert!(matches!(
        result,
        Err(SettlementError::PreconditionFailed { .. })
    ));
}

/// Test: a debit cannot open an account
#[test]
fn test_debit_on_creation_is_rejected() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();

    let update = AccountUpdateBuilder::new(AccountId::base(keypair.public_key()))
        .require_new()
        .debit(1)
        .build()
        .authorize_signature(&keypair);
    let result = chain.apply(&Transaction::single(update));

    assert!(matches!(
        result,
        Err(SettlementError::InsufficientBalance { .. })
    ));
}

// ============================================================================
// INTRA-TRANSACTION ORDERING
// ============================================================================

/// Test: later roots see the staged effects of earlier roots
#[test]
fn test_later_roots_see_earlier_effects() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());

    let create = AccountUpdateBuilder::new(id.clone())
        .require_new()
        .credit(10)
        .build()
        .authorize_signature(&keypair);
    let top_up = AccountUpdateBuilder::new(id.clone())
        .require_balance_at_least(10)
        .credit(5)
        .build();
    chain
        .apply(&Transaction::new(vec![create, top_up]))
        .unwrap();

    assert_eq!(chain.balance(&id), 15);
    assert_eq!(chain.height(), 1);
}

/// Test: children validate against the parent's staged effects
#[test]
fn test_children_see_parent_effects() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());
    chain.fund(&keypair.public_key(), 1);

    let child = AccountUpdateBuilder::new(id.clone())
        .require_minted_so_far(3)
        .build();
    let parent = AccountUpdateBuilder::new(id.clone())
        .set_state(AccountState::SubLedger { minted_so_far: 3 })
        .child(child)
        .build()
        .authorize_signature(&keypair);
    chain.apply(&Transaction::single(parent)).unwrap();

    assert_eq!(
        chain.account(&id).unwrap().state.minted_so_far(),
        Some(3)
    );
}

/// Test: a failing child rolls back its whole transaction
#[test]
fn test_failing_child_rolls_back_everything() {
    let mut chain = LocalChain::new();
    let keypair = Keypair::generate();
    let id = AccountId::base(keypair.public_key());
    chain.fund(&keypair.public_key(), 100);

    let child = AccountUpdateBuilder::new(id.clone())
        .require_balance_at_least(1_000)
        .build();
    let parent = AccountUpdateBuilder::new(id.clone())
        .credit(500)
        .child(child)
        .build();
    let result = chain.apply(&Transaction::single(parent));

    assert!(matches!(
        result,
        Err(SettlementError::PreconditionFailed { .. })
    ));
    assert_eq!(chain.balance(&id), 100);
}
