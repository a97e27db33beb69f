//! Fetch a URL with optional SPKI pins and print the response envelope.
//!
//! ```text
//! cargo run --example pinned_get -- https://example.org sha256/AAAA...=
//! ```

use pinnet::{Client, VerificationTechnique};
use std::time::Duration;

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: pinned_get <url> [spki-pins-csv] [preflight|sslctx|both]");
        std::process::exit(2);
    };

    let client = Client::builder()
        .default_timeout(Duration::from_secs(20))
        .build();

    let mut request = client.get(&url);
    if let Some(pins) = args.next() {
        request = request.spki_pins(pins);
    }
    if let Some(technique) = args.next() {
        request = request.technique(VerificationTechnique::from_selector(&technique));
    }

    println!("{}", request.send().to_json());
}
