//! URL parsing into fixed-capacity fields.
//!
//! Parsing happens in two steps. [`scan`] tokenises the URL into borrowed
//! components without any size limits, then [`UrlFields::parse`] validates
//! each component and copies it into its fixed-capacity field.

use heapless::String;

use super::error::Error;
use crate::config::{Config, HOSTNAME_CAPACITY, PATH_CAPACITY, PORT_CAPACITY, SCHEMA_CAPACITY};

/// Borrowed components of a URL, as found by [`scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components<'a> {
    pub schema: &'a str,
    pub userinfo: Option<&'a str>,
    pub host: &'a str,
    pub port: Option<&'a str>,
    /// Path plus query, without the fragment.
    pub path: Option<&'a str>,
}

/// Split `schema://[userinfo@]host[:port][/path][?query][#fragment]`.
///
/// Returns `None` if the URL cannot be tokenised at all.
pub fn scan(url: &str) -> Option<Components<'_>> {
    if url.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return None;
    }

    let (schema, rest) = url.split_once("://")?;
    let mut chars = schema.chars();
    if !chars.next()?.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    // Fragments are never sent on the wire.
    let rest = rest.split('#').next().unwrap_or(rest);

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    let path = if path.is_empty() { None } else { Some(path) };

    let (userinfo, hostport) = match authority.rsplit_once('@') {
        Some((user, hostport)) => (Some(user), hostport),
        None => (None, authority),
    };

    let (host, port) = if let Some(literal) = hostport.strip_prefix('[') {
        // IPv6 literal
        let (host, after) = literal.split_once(']')?;
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':')?)),
        }
    } else {
        match hostport.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (hostport, None),
        }
    };

    if host.is_empty() {
        return None;
    }
    if let Some(port) = port {
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    Some(Components {
        schema,
        userinfo,
        host,
        port,
        path,
    })
}

/// Parsed URL, stored in fixed-capacity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFields {
    schema: String<SCHEMA_CAPACITY>,
    hostname: String<HOSTNAME_CAPACITY>,
    path: String<PATH_CAPACITY>,
    port: u16,
    is_secure: bool,
}

impl UrlFields {
    /// Parse `url`, filling defaults from `config`.
    ///
    /// Only `http` and `https` are accepted; any other schema fails with
    /// [`Error::MalformedUrl`]. A component whose length reaches its field
    /// capacity fails with [`Error::FieldTooLong`].
    pub fn parse(url: &str, config: &Config) -> Result<Self, Error> {
        let components = scan(url).ok_or_else(|| {
            error!("Error parsing URL");
            Error::MalformedUrl
        })?;

        let mut schema: String<SCHEMA_CAPACITY> = bounded(components.schema, "schema")?;
        schema.make_ascii_lowercase();
        let default_port = config.default_port(&schema).ok_or_else(|| {
            error!("Unsupported schema {}", schema.as_str());
            Error::MalformedUrl
        })?;

        let hostname = bounded(components.host, "hostname")?;

        let port = match components.port {
            Some(text) => {
                let _: String<PORT_CAPACITY> = bounded(text, "port")?;
                match text.parse::<u16>() {
                    Ok(port) if port > 0 => port,
                    _ => {
                        error!("Invalid port {}", text);
                        return Err(Error::MalformedUrl);
                    }
                }
            }
            None => default_port,
        };

        let path = match components.path {
            Some(path) if path.starts_with('/') => bounded(path, "path")?,
            Some(query) => {
                // "http://host?x=1" requests "/?x=1"
                if query.len() + 1 >= PATH_CAPACITY {
                    error!("Error parsing path ({})", Error::FieldTooLong.code());
                    return Err(Error::FieldTooLong);
                }
                let mut path = String::new();
                path.push('/').map_err(|_| Error::FieldTooLong)?;
                path.push_str(query).map_err(|_| Error::FieldTooLong)?;
                path
            }
            None => root(),
        };

        let is_secure = schema == "https";
        debug!(
            "Hostname: {}, Port: {}, URI: {}",
            hostname.as_str(),
            port,
            path.as_str()
        );

        Ok(Self {
            schema,
            hostname,
            path,
            port,
            is_secure,
        })
    }

    /// Lower-cased schema, `http` or `https`.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Path and query, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the schema asks for TLS.
    pub fn is_secure(&self) -> bool {
        self.is_secure
    }
}

/// Copy `value` into a field of capacity `N`, which must keep one spare byte.
fn bounded<const N: usize>(value: &str, field: &str) -> Result<String<N>, Error> {
    if value.len() >= N {
        error!(
            "Error parsing {} ({})",
            field,
            Error::FieldTooLong.code()
        );
        return Err(Error::FieldTooLong);
    }
    String::try_from(value).map_err(|_| Error::FieldTooLong)
}

fn root() -> String<PATH_CAPACITY> {
    let mut path = String::new();
    // Capacity is far above one byte.
    let _ = path.push('/');
    path
}
