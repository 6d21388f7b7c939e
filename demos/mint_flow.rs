// End-to-end mint flow: deploy a controller, provision a sub-ledger, and
// relay a growing lock attestation into wrapped-token mints.
//
// Run with: cargo run --example mint_flow
// Set RUST_LOG=debug to watch the settlement layer work.

use std::error::Error;
use std::sync::Arc;

use lockmint::controller::{Controller, ControllerConfig, ControllerProgram};
use lockmint::gateway::{MintRelayer, MockAttestationSource, RelayOutcome, RelayerConfig};
use lockmint::identity::Keypair;
use lockmint::ledger::MintProgram;
use lockmint::program::VerificationProgram;
use lockmint::settlement::{LocalChain, TransitionProgram};
use lockmint::storage::BridgeStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("\n========================================");
    println!("   Wrapped-Token Mint Flow");
    println!("========================================\n");

    // Step 1: identities and a fresh chain
    let controller_key = Keypair::generate();
    let owner = Keypair::generate();
    let mut chain = LocalChain::new();
    println!("Step 1: identities");
    println!("  controller: {}", controller_key.public_key());
    println!("  owner:      {}", owner.public_key());

    // Step 2: register the sub-ledger program and deploy the controller,
    // committing to the program's hash
    let mint_program = MintProgram::new();
    let committed = mint_program.hash();
    chain.register_program(Arc::new(mint_program));

    let controller = Controller::deploy(
        &mut chain,
        &controller_key,
        ControllerConfig::new(committed),
    )?;
    println!("\nStep 2: controller deployed");
    println!("  committed program: {}", committed);
    println!("  token namespace:   {}", controller.token_id());

    // Step 3: provisioning refuses any program but the committed one
    let rogue = VerificationProgram::new("sub-ledger-mint", 99, b"tampered".to_vec());
    match controller.set_up_storage(&mut chain, &owner, &rogue) {
        Err(e) => println!("\nStep 3: rogue program refused\n  {}", e),
        Ok(()) => unreachable!("a mismatched program must not provision"),
    }

    controller.set_up_storage(&mut chain, &owner, MintProgram::new().verification_program())?;
    println!("  sub-ledger provisioned at counter 0");

    // Step 4: relay a growing attestation; the third pass finds nothing new
    let source = Arc::new(MockAttestationSource::new().with_locked_sequence(&[100, 150]));
    let mut relayer = MintRelayer::new(RelayerConfig::new(), source);

    println!("\nStep 4: relaying attestations");
    for pass in 1..=3 {
        let outcome = relayer.relay_mint(&mut chain, &controller, &owner).await?;
        match outcome {
            RelayOutcome::Minted {
                amount,
                minted_so_far,
            } => println!(
                "  pass {}: minted {:>3} (counter now {})",
                pass, amount, minted_so_far
            ),
            RelayOutcome::NothingToMint => println!("  pass {}: nothing to mint", pass),
        }
    }

    // Step 5: an attestation below the counter cannot pass
    match controller.mint(&mut chain, &owner, 60) {
        Err(e) => println!("\nStep 5: shrinking attestation refused\n  {}", e),
        Ok(_) => unreachable!("the counter never moves down"),
    }

    // Step 6: persist and resume
    let dir = tempfile::tempdir()?;
    let store = BridgeStore::open(dir.path())?;
    store.save_chain(&chain)?;
    store.save_controller_record(&controller.record())?;
    store.flush()?;

    let mut resumed_chain = store
        .load_chain()?
        .ok_or("chain missing after save")?;
    resumed_chain.register_program(Arc::new(MintProgram::new()));
    resumed_chain.register_program(Arc::new(ControllerProgram::new()));
    let resumed = Controller::from_record(
        store
            .load_controller_record()?
            .ok_or("controller record missing after save")?,
    );
    let credited = resumed.mint(&mut resumed_chain, &owner, 175)?;
    println!("\nStep 6: resumed from disk, minted {} more", credited);

    println!("\n========================================");
    println!("   Final State");
    println!("========================================\n");
    println!(
        "  minted_so_far:   {}",
        resumed
            .minted_so_far(&resumed_chain, &owner.public_key())
            .unwrap_or(0)
    );
    println!(
        "  wrapped balance: {}",
        resumed.wrapped_balance(&resumed_chain, &owner.public_key())
    );
    println!("  chain height:    {}", resumed_chain.height());
    let stats = relayer.stats();
    println!(
        "  relayer: {} fetched, {} minted, {} skipped, {} total",
        stats.attestations_fetched,
        stats.mints_submitted,
        stats.mints_skipped,
        stats.total_amount_minted
    );

    Ok(())
}
