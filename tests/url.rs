use embedded_requests::config::{Config, HOSTNAME_CAPACITY, PATH_CAPACITY};
use embedded_requests::network::application::requests::{Error, UrlFields};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HOST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";
const PATH_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._~%=&";

fn random_string(rng: &mut StdRng, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn random_case(rng: &mut StdRng, text: &str) -> String {
    text.chars()
        .map(|c| {
            if rng.gen_bool(0.5) {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

#[test]
fn test_generated_urls_parse_into_their_components() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let config = Config::DEFAULT;

    for _ in 0..2_000 {
        let secure = rng.gen_bool(0.5);
        let schema = if secure { "https" } else { "http" };

        let labels = rng.gen_range(1..4);
        let host = (0..labels)
            .map(|_| {
                let len = rng.gen_range(1..12);
                random_string(&mut rng, HOST_CHARS, len)
            })
            .collect::<Vec<_>>()
            .join(".");

        let port: Option<u16> = rng.gen_bool(0.5).then(|| rng.gen_range(1..=u16::MAX));

        let segments = rng.gen_range(0..5);
        let mut path = String::new();
        for _ in 0..segments {
            let len = rng.gen_range(0..16);
            path.push('/');
            path.push_str(&random_string(&mut rng, PATH_CHARS, len));
        }
        if rng.gen_bool(0.3) {
            let len = rng.gen_range(1..10);
            path.push_str("/?");
            path.push_str(&random_string(&mut rng, PATH_CHARS, len));
        }

        let mut url = format!("{}://{}", random_case(&mut rng, schema), host);
        if let Some(port) = port {
            url.push_str(&format!(":{}", port));
        }
        url.push_str(&path);
        if rng.gen_bool(0.2) {
            url.push_str("#fragment");
        }

        let fields = UrlFields::parse(&url, &config).unwrap_or_else(|e| panic!("{}: {:?}", url, e));
        assert_eq!(fields.schema(), schema, "{}", url);
        assert_eq!(fields.hostname(), host, "{}", url);
        assert_eq!(fields.is_secure(), secure, "{}", url);
        let expected_port = port.unwrap_or(if secure { config.https_port } else { config.http_port });
        assert_eq!(fields.port(), expected_port, "{}", url);
        let expected_path = if path.is_empty() { "/" } else { path.as_str() };
        assert_eq!(fields.path(), expected_path, "{}", url);
    }
}

#[test]
fn test_random_input_never_panics() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = Config::DEFAULT;
    let alphabet: Vec<u8> = (0x20u8..0x7f).collect();

    for _ in 0..5_000 {
        let len = rng.gen_range(0..120);
        let mut input = random_string(&mut rng, &alphabet, len);
        if rng.gen_bool(0.5) {
            input.insert_str(0, "http://");
        }
        if let Ok(fields) = UrlFields::parse(&input, &config) {
            assert!(!fields.hostname().is_empty());
            assert!(fields.path().starts_with('/'));
            assert!(fields.port() > 0);
        }
    }
}

#[test]
fn test_field_capacities_are_exclusive() {
    let config = Config::DEFAULT;
    let host = "h".repeat(HOSTNAME_CAPACITY - 1);
    let url = format!("http://{}/", host);
    assert_eq!(UrlFields::parse(&url, &config).unwrap().hostname(), host);

    let url = format!("http://{}/", "h".repeat(HOSTNAME_CAPACITY));
    assert_eq!(UrlFields::parse(&url, &config), Err(Error::FieldTooLong));

    let path = format!("/{}", "p".repeat(PATH_CAPACITY - 2));
    let url = format!("http://host{}", path);
    assert_eq!(UrlFields::parse(&url, &config).unwrap().path(), path);

    let url = format!("http://host/{}", "p".repeat(PATH_CAPACITY - 1));
    assert_eq!(UrlFields::parse(&url, &config), Err(Error::FieldTooLong));
}
