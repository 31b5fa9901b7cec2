//! Random transaction inputs.
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use rinha_core::{ClientSeed, TransactionKind, TransactionRequest, DESCRIPTION_LEN, MAX_AMOUNT};

/// Uniform choice over the seeded clients.
///
/// Falls back to id 1 when no client is seeded; configuration validation
/// prevents that from happening during a run.
pub fn pick_client_id<R: Rng + ?Sized>(rng: &mut R, clients: &[ClientSeed]) -> i64 {
    clients.choose(rng).map(|c| c.id).unwrap_or(1)
}

pub fn random_amount<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(1..=MAX_AMOUNT)
}

pub fn random_description<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(DESCRIPTION_LEN)
        .map(char::from)
        .collect()
}

pub fn random_transaction<R: Rng + ?Sized>(
    rng: &mut R,
    kind: TransactionKind,
) -> TransactionRequest {
    TransactionRequest {
        value: random_amount(rng),
        kind,
        description: random_description(rng),
    }
}
