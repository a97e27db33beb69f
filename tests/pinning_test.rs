//! Certificate pinning integration tests against a local TLS server.

mod common;

use common::{closed_port, corrupt, TlsServer};
use pinnet::socket::probe::HandshakeProbe;
use pinnet::socket::tls::TlsConfig;
use pinnet::tls::verifier::verify;
use pinnet::{Client, PinSet, RawRequest, VerificationTechnique};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client() -> Client {
    Client::builder()
        .default_timeout(Duration::from_secs(10))
        .build()
}

#[test]
fn test_probe_returns_leaf_material() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();

    let material = HandshakeProbe::new(TlsConfig::probe().ca_file(Some(ca.path().to_path_buf())))
        .timeout(Some(Duration::from_secs(5)))
        .probe("localhost", server.port)
        .unwrap();

    assert_eq!(material.spki_digest(), server.cert.spki_pin());
    assert_eq!(material.certificate_digest(), server.cert.cert_pin());

    let pins = PinSet::from_csv(Some(&server.cert.spki_pin()), None);
    assert!(verify(&material, &pins).passed);
    assert_eq!(server.served(), 0);
}

#[test]
fn test_probe_untrusted_without_ca() {
    let server = TlsServer::start();
    let result = HandshakeProbe::new(TlsConfig::probe())
        .timeout(Some(Duration::from_secs(5)))
        .probe("localhost", server.port);
    assert!(result.is_err());
    assert!(result.unwrap_err().allows_fallback());
}

#[test]
fn test_preflight_spki_match() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();

    let env = client()
        .get(server.url())
        .ca_info(ca.path())
        .spki_pins(format!("sha256/{}", server.cert.spki_pin()))
        .technique(VerificationTechnique::Preflight)
        .send();

    assert_eq!(env.error, None);
    assert_eq!(env.status, Some(200));
    assert_eq!(env.body, "ok");
    assert_eq!(server.served(), 1);
}

#[test]
fn test_preflight_mismatch_never_transfers() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();

    let env = client()
        .get(server.url())
        .ca_info(ca.path())
        .spki_pins(corrupt(&server.cert.spki_pin()))
        .send();

    assert_eq!(env.status, None);
    assert_eq!(env.error.as_deref(), Some("SSL pinning mismatch"));
    assert_eq!(server.served(), 0);
}

#[test]
fn test_cert_pin_inline_match() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();

    let env = client()
        .get(server.url())
        .ca_info(ca.path())
        .cert_pins(server.cert.cert_pin())
        .technique(VerificationTechnique::InlineCallback)
        .send();

    assert_eq!(env.status, Some(200));
    assert_eq!(server.served(), 1);
}

#[test]
fn test_inline_mismatch_aborts_transfer() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();

    let env = client()
        .get(server.url())
        .ca_info(ca.path())
        .cert_pins(corrupt(&server.cert.cert_pin()))
        .technique(VerificationTechnique::InlineCallback)
        .send();

    assert_eq!(env.status, None);
    assert!(env.error.is_some());
    assert_eq!(server.served(), 0);
}

#[test]
fn test_insecure_still_enforces_pins() {
    let server = TlsServer::start();

    let ok = client()
        .get(server.url())
        .insecure()
        .spki_pins(server.cert.spki_pin())
        .send();
    assert_eq!(ok.status, Some(200));

    let bad = client()
        .get(server.url())
        .insecure()
        .spki_pins(corrupt(&server.cert.spki_pin()))
        .send();
    assert_eq!(bad.error.as_deref(), Some("SSL pinning mismatch"));
    assert_eq!(server.served(), 1);
}

#[test]
fn test_untrusted_chain_without_pins_fails() {
    let server = TlsServer::start();
    let env = client().get(server.url()).send();
    assert_eq!(env.status, None);
    assert_eq!(server.served(), 0);
}

#[test]
fn test_reserved_keys_via_raw_request() {
    let server = TlsServer::start();
    let ca = server.cert.ca_file();
    let raw = RawRequest::get(server.url())
        .header("x-curl-caINFO", ca.path().display().to_string())
        .header("X-Curl-SpkiPins", format!(" junk , {} ", server.cert.spki_pin()))
        .header("X-Curl-Technique", "both")
        .timeout_ms(10_000);

    let env = client().execute(&raw);
    assert_eq!(env.status, Some(200));
}

#[test]
fn test_concurrent_requests_keep_their_own_pins() {
    let a = Arc::new(TlsServer::start());
    let b = Arc::new(TlsServer::start());
    let client = client();

    let mut handles = Vec::new();
    for i in 0..8 {
        let (own, other) = if i % 2 == 0 {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        let client = client.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..3 {
                let ok = client
                    .get(own.url())
                    .insecure()
                    .spki_pins(own.cert.spki_pin())
                    .technique(VerificationTechnique::InlineCallback)
                    .send();
                assert_eq!(ok.status, Some(200), "{:?}", ok.error);

                let rejected = client
                    .get(own.url())
                    .insecure()
                    .spki_pins(other.cert.spki_pin())
                    .technique(VerificationTechnique::InlineCallback)
                    .send();
                assert_eq!(rejected.status, None);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(a.served() + b.served(), 24);
}

#[test]
fn test_unreachable_preflight_falls_back_to_platform() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(None));
    let platform = {
        let calls = calls.clone();
        let seen = seen.clone();
        move |host: &str, port: u16, spki: Option<&str>, cert: Option<&str>| {
            calls.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = Some((
                host.to_string(),
                port,
                spki.map(str::to_string),
                cert.map(str::to_string),
            ));
            false
        }
    };
    let client = Client::builder()
        .platform_verifier(Arc::new(platform))
        .default_timeout(Duration::from_secs(5))
        .build();

    let port = closed_port();
    let env = client
        .get(format!("https://127.0.0.1:{}/", port))
        .spki_pins("sha256/AAA=,BBB=")
        .technique(VerificationTechnique::Preflight)
        .send();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(env.error.as_deref(), Some("SSL pinning mismatch"));
    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        ("127.0.0.1".to_string(), port, Some("AAA=,BBB=".to_string()), None)
    );
}

#[test]
fn test_unreachable_preflight_without_platform_fails_closed() {
    let env = client()
        .get(format!("https://127.0.0.1:{}/", closed_port()))
        .spki_pins("AAA=")
        .send();
    assert_eq!(env.status, None);
    assert!(env
        .error
        .unwrap()
        .starts_with("SSL pinning verification failed: "));
}
