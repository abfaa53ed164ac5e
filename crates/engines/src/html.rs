//! Low-level HTML string scanning helpers.
//!
//! Deliberately naive: engines only need coarse signals (tag presence, meta
//! content, rough text volume), not a DOM. All matching is ASCII
//! case-insensitive.

/// Inner text of the first `<tag>...</tag>` pair, tags excluded.
pub fn tag_inner_ci(html: &str, tag: &str) -> Option<String> {
	let lc = html.to_ascii_lowercase();
	let open = format!("<{}", tag.to_ascii_lowercase());
	let close = format!("</{}>", tag.to_ascii_lowercase());

	let open_idx = lc.find(&open)?;
	let after_open = lc[open_idx..].find('>')? + open_idx + 1;
	let close_idx = lc[after_open..].find(&close)? + after_open;
	Some(normalize_ws(&html[after_open..close_idx]))
}

/// Count opening occurrences of a tag (`<h1>`, `<h1 class=..>`).
pub fn count_tag_ci(html: &str, tag: &str) -> usize {
	let lc = html.to_ascii_lowercase();
	let open = format!("<{}", tag.to_ascii_lowercase());
	let mut count = 0;
	let mut from = 0;
	while let Some(idx) = lc[from..].find(&open) {
		let at = from + idx + open.len();
		// Require a tag boundary so `<h1` does not match `<h10` or `<html`.
		match lc.as_bytes().get(at) {
			Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'/') => count += 1,
			_ => {},
		}
		from = at;
	}
	count
}

/// `content` attribute of the first `<meta name="{name}" ...>` tag.
pub fn meta_content_ci(html: &str, name: &str) -> Option<String> {
	let lc = html.to_ascii_lowercase();
	let name_lc = name.to_ascii_lowercase();
	let mut from = 0;
	while let Some(idx) = lc[from..].find("<meta") {
		let start = from + idx;
		let end = lc[start..].find('>').map(|e| start + e)?;
		let tag = &html[start..end];
		if attr_value_ci(tag, "name")
			.map(|v| v.to_ascii_lowercase() == name_lc)
			.unwrap_or(false)
		{
			return attr_value_ci(tag, "content");
		}
		from = end;
	}
	None
}

/// Value of an attribute inside one tag's source, handling both quote styles
/// and unquoted values.
pub fn attr_value_ci(tag: &str, attr: &str) -> Option<String> {
	let lc = tag.to_ascii_lowercase();
	let needle = format!("{}=", attr.to_ascii_lowercase());
	let mut from = 0;
	while let Some(idx) = lc[from..].find(&needle) {
		let at = from + idx;
		// Attribute names match at word boundaries only.
		let boundary_ok = at == 0
			|| lc
				.as_bytes()
				.get(at - 1)
				.map(|b| b.is_ascii_whitespace())
				.unwrap_or(true);
		if !boundary_ok {
			from = at + needle.len();
			continue;
		}
		let rest = &tag[at + needle.len()..];
		let value = match rest.as_bytes().first() {
			Some(b'"') => rest[1..].split('"').next(),
			Some(b'\'') => rest[1..].split('\'').next(),
			_ => rest.split(|c: char| c.is_ascii_whitespace() || c == '>').next(),
		};
		return value.map(|v| v.to_string());
	}
	None
}

/// First value of `attr` across all `<tag ...>` occurrences.
pub fn first_tag_attr_ci(html: &str, tag: &str, attr: &str) -> Option<String> {
	let lc = html.to_ascii_lowercase();
	let open = format!("<{}", tag.to_ascii_lowercase());
	let mut from = 0;
	while let Some(idx) = lc[from..].find(&open) {
		let start = from + idx;
		let end = lc[start..].find('>').map(|e| start + e)?;
		if let Some(value) = attr_value_ci(&html[start..end], attr) {
			if !value.is_empty() {
				return Some(value);
			}
		}
		from = end;
	}
	None
}

/// First stylesheet href (`<link rel="stylesheet" href=..>`).
pub fn first_stylesheet_href(html: &str) -> Option<String> {
	let lc = html.to_ascii_lowercase();
	let mut from = 0;
	while let Some(idx) = lc[from..].find("<link") {
		let start = from + idx;
		let end = lc[start..].find('>').map(|e| start + e)?;
		let tag = &html[start..end];
		let is_stylesheet = attr_value_ci(tag, "rel")
			.map(|r| r.to_ascii_lowercase().contains("stylesheet"))
			.unwrap_or(false);
		if is_stylesheet {
			if let Some(href) = attr_value_ci(tag, "href") {
				if !href.is_empty() {
					return Some(href);
				}
			}
		}
		from = end;
	}
	None
}

/// Remove all `<...>` tags, then collapse whitespace.
pub fn strip_tags(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	let mut in_tag = false;
	for ch in html.chars() {
		match ch {
			'<' => in_tag = true,
			'>' => in_tag = false,
			_ if !in_tag => out.push(ch),
			_ => {},
		}
	}
	normalize_ws(&out)
}

/// Visible word count with `<script>`/`<style>` blocks removed.
pub fn visible_word_count(html: &str) -> usize {
	let without_scripts = remove_block_ci(html, "script");
	let without_styles = remove_block_ci(&without_scripts, "style");
	strip_tags(&without_styles).split_whitespace().count()
}

fn remove_block_ci(html: &str, tag: &str) -> String {
	let open = format!("<{}", tag.to_ascii_lowercase());
	let close = format!("</{}>", tag.to_ascii_lowercase());
	let mut out = String::with_capacity(html.len());
	let mut rest = html;
	loop {
		let lc = rest.to_ascii_lowercase();
		match lc.find(&open) {
			Some(start) => {
				out.push_str(&rest[..start]);
				match lc[start..].find(&close) {
					Some(end_rel) => rest = &rest[start + end_rel + close.len()..],
					None => return out,
				}
			},
			None => {
				out.push_str(rest);
				return out;
			},
		}
	}
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	let mut prev_space = false;
	for ch in s.chars() {
		if ch.is_whitespace() {
			if !prev_space {
				out.push(' ');
				prev_space = true;
			}
		} else {
			out.push(ch);
			prev_space = false;
		}
	}
	out.trim().to_string()
}
