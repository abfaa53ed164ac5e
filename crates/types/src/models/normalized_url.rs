//! Canonical URL form used for analysis targets and cache keys

use serde::{Deserialize, Serialize};
use url::Url;

use crate::analyses::ValidationError;

/// A validated, canonicalized absolute http/https URL.
///
/// Two URLs that differ only in insignificant ways (fragment, query-parameter
/// order, a trailing slash on a non-root path, default port) normalize to the
/// same string and therefore share cache entries. The canonical form is:
/// lowercased scheme and host, default port dropped, fragment dropped, query
/// pairs sorted bytewise, empty path rendered as `/`, and a single trailing
/// slash stripped from non-root paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedUrl {
	url: Url,
	canonical: String,
}

impl NormalizedUrl {
	/// Parse and canonicalize an absolute http/https URL.
	pub fn parse(input: &str) -> Result<Self, ValidationError> {
		let mut url = Url::parse(input.trim()).map_err(|e| ValidationError::MalformedUrl {
			url: input.to_string(),
			reason: e.to_string(),
		})?;

		match url.scheme() {
			"http" | "https" => {},
			other => {
				return Err(ValidationError::UnsupportedScheme {
					scheme: other.to_string(),
				})
			},
		}

		if url.host_str().is_none() {
			return Err(ValidationError::MalformedUrl {
				url: input.to_string(),
				reason: "missing host".to_string(),
			});
		}

		url.set_fragment(None);

		// Sort query pairs so parameter order never splits the cache.
		let mut pairs: Vec<(String, String)> = url
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect();
		if pairs.is_empty() {
			url.set_query(None);
		} else {
			pairs.sort();
			let mut serializer = url::form_urlencoded::Serializer::new(String::new());
			for (k, v) in &pairs {
				serializer.append_pair(k, v);
			}
			url.set_query(Some(&serializer.finish()));
		}

		// `Url` renders an empty path as `/`; strip one trailing slash elsewhere.
		let path = url.path().to_string();
		if path.len() > 1 && path.ends_with('/') {
			url.set_path(path.trim_end_matches('/'));
		}

		let canonical = url.to_string();
		Ok(Self { url, canonical })
	}

	/// The canonical string form (the cache-key component).
	pub fn as_str(&self) -> &str {
		&self.canonical
	}

	/// The underlying parsed URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn scheme(&self) -> &str {
		self.url.scheme()
	}

	pub fn host_str(&self) -> &str {
		// Host presence is validated at construction.
		self.url.host_str().unwrap_or_default()
	}

	pub fn path(&self) -> &str {
		self.url.path()
	}

	/// `scheme://host[:port]` with no path, for sibling lookups like robots.txt.
	pub fn origin_str(&self) -> String {
		match self.url.port() {
			Some(port) => format!("{}://{}:{}", self.url.scheme(), self.host_str(), port),
			None => format!("{}://{}", self.url.scheme(), self.host_str()),
		}
	}

	/// Whether the target is served over TLS.
	pub fn is_https(&self) -> bool {
		self.url.scheme() == "https"
	}
}

impl std::fmt::Display for NormalizedUrl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.canonical)
	}
}

impl TryFrom<String> for NormalizedUrl {
	type Error = ValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<NormalizedUrl> for String {
	fn from(value: NormalizedUrl) -> Self {
		value.canonical
	}
}
