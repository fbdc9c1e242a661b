//! SSML document construction for the synthesis request body.
//!
//! User text may contain inline pause markers of the form `[p-<n>]`, where
//! `<n>` is a whole number of seconds. The builder rewrites each marker into
//! an SSML `<break time='<n>s'/>` directive and wraps the result in a
//! `<speak>` document carrying the voice, language, gender, and expressive
//! style.
//!
//! This module performs no network or disk I/O; it is a pure text transform.
//!
//! # Known gap: no XML escaping of user text
//!
//! User text is embedded in the document verbatim. Markup metacharacters
//! (`<`, `&`, ...) in the text are NOT escaped, matching the behavior every
//! stored fingerprint was computed against. Callers that want escaping can
//! pre-process the text with [`escape_xml`]; the builder itself must not
//! start escaping silently, because that would change what the service
//! receives for previously-fingerprinted inputs.

use std::sync::OnceLock;

use regex::Regex;

use super::voices::VoiceDescriptor;

/// Matches a pause marker: `[p-2]` means a two-second pause.
fn pause_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[p-(\d+)\]").expect("pause marker pattern is valid"))
}

/// Rewrites every well-formed pause marker into an SSML break directive.
///
/// Text without markers passes through unchanged. Malformed markers
/// (`[p-]`, `[p-two]`) are left as literal text for the voice to read out,
/// which makes the mistake audible rather than silently swallowed.
pub fn rewrite_pause_markers(text: &str) -> String {
    pause_marker_regex()
        .replace_all(text, "<break time='${1}s'/>")
        .into_owned()
}

/// Escapes XML metacharacters (`&`, `<`, `>`, `"`, `'`).
///
/// Provided for callers that want to sanitize text before building a
/// document; see the module docs for why this is not applied automatically.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Builds the full SSML request document for a conversion.
///
/// Pause markers in `text` are rewritten first, then the result is wrapped
/// with the voice's language, gender, name and the requested expressive
/// style.
pub fn build_ssml(text: &str, voice: &VoiceDescriptor, style: &str) -> String {
    let body = rewrite_pause_markers(text);
    format!(
        r#"<speak version='1.0' xmlns:mstts="https://www.w3.org/2001/mstts" xml:lang='{lang}'>
  <voice xml:lang='{lang}' xml:gender='{gender}' name='{name}'>
    <mstts:express-as style="{style}">
      {body}
    </mstts:express-as>
  </voice>
</speak>"#,
        lang = voice.language,
        gender = voice.gender,
        name = voice.voice_name,
        style = style,
        body = body,
    )
}
