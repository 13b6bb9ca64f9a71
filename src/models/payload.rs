use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

/// A single synthetic record POSTed to the target flow.
///
/// The field mix is deliberately uneven so the target's rule conditions all
/// get exercised: `alpha` is sometimes small (0-9) and sometimes larger
/// (10-100), `beta` is sometimes empty, `charlie` is a fair coin.
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub req_id: String,
    pub alpha: u32,
    pub beta: String,
    pub charlie: bool,
}

impl Payload {
    /// Generate one payload with an auto-assigned request id based on the
    /// issuing worker and iteration.
    pub fn generate(vu: u64, iter: u64) -> Self {
        let id = format!("req_{}_{}_{}", vu, iter, Utc::now().timestamp_millis());
        Self::with_id(&mut rand::thread_rng(), id)
    }

    fn with_id<R: Rng>(rng: &mut R, req_id: String) -> Self {
        let alpha = if rng.gen_bool(0.5) {
            rng.gen_range(0..=9)
        } else {
            rng.gen_range(10..=100)
        };
        let beta = if rng.gen_bool(0.5) {
            String::new()
        } else {
            let len = rng.gen_range(1..=10);
            random_string(rng, len)
        };
        Payload {
            req_id,
            alpha,
            beta,
            charlie: rng.gen_bool(0.5),
        }
    }
}

/// Generate a bulk payload of `size` records sharing an id prefix.
pub fn generate_bulk(size: u64, prefix: &str, vu: u64, iter: u64) -> Vec<Payload> {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|i| {
            let id = format!("{}_{}_{}_{}", prefix, vu, iter, i);
            Payload::with_id(&mut rng, id)
        })
        .collect()
}

fn random_string<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}
