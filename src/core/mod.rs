pub mod fingerprint;
pub mod ssml;
pub mod voices;

// Re-export commonly used items for convenience
pub use ssml::{build_ssml, escape_xml, rewrite_pause_markers};
pub use voices::{find_voice, VoiceDescriptor, FILE_EXT, OUTPUT_FORMAT, STYLES, VOICES};
