//! Static voice catalog for the synthesis service.
//!
//! Each entry maps a human-readable label to the BCP-47 language tag,
//! grammatical gender, and vendor voice name the SSML document needs.
//! The catalog is fixed at compile time and never persisted; history rows
//! store the label only.

/// A single selectable voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Human-readable label shown to the user and stored in history rows.
    pub label: &'static str,
    /// BCP-47 language tag, e.g. "en-US".
    pub language: &'static str,
    /// Grammatical gender as the synthesis service expects it.
    pub gender: &'static str,
    /// Vendor voice name, e.g. "en-US-AriaNeural".
    pub voice_name: &'static str,
}

/// All voices the tool offers.
pub const VOICES: [VoiceDescriptor; 4] = [
    VoiceDescriptor {
        label: "Hindi - Male (Madhur)",
        language: "hi-IN",
        gender: "Male",
        voice_name: "hi-IN-MadhurNeural",
    },
    VoiceDescriptor {
        label: "Hindi - Female (Swara)",
        language: "hi-IN",
        gender: "Female",
        voice_name: "hi-IN-SwaraNeural",
    },
    VoiceDescriptor {
        label: "English - Male (Guy)",
        language: "en-US",
        gender: "Male",
        voice_name: "en-US-GuyNeural",
    },
    VoiceDescriptor {
        label: "English - Female (Aria)",
        language: "en-US",
        gender: "Female",
        voice_name: "en-US-AriaNeural",
    },
];

/// Expressive styles accepted by the `mstts:express-as` element.
pub const STYLES: [&str; 6] = [
    "default",
    "cheerful",
    "sad",
    "angry",
    "excited",
    "empathetic",
];

/// Output format requested via the `X-Microsoft-OutputFormat` header.
///
/// Fixed for the whole tool; the fingerprint covers it so a future format
/// change does not alias old history entries.
pub const OUTPUT_FORMAT: &str = "audio-48khz-192kbitrate-mono-mp3";

/// File extension matching [`OUTPUT_FORMAT`].
pub const FILE_EXT: &str = ".mp3";

/// Looks up a voice by its label.
pub fn find_voice(label: &str) -> Option<&'static VoiceDescriptor> {
    VOICES.iter().find(|v| v.label == label)
}
