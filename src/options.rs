use crate::consts::DEFAULT_CLONING_THRESHOLD;

/// which initial Markov graph the coder is seeded with. Encoder and decoder
/// must agree on this or the decoded stream is garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    /// 8x256 mesh addressed by the last 8 bits seen
    #[default]
    Braid,
    /// depth-7 binary tree whose leaves loop back to the root
    Byte,
}

impl ModelKind {
    /// parses the CLI model name. Anything unrecognized falls back to the
    /// braid mesh, matching the historical command-line behavior.
    pub fn from_name(name: &str) -> ModelKind {
        match name {
            "braid" => ModelKind::Braid,
            "byte" => ModelKind::Byte,
            _ => ModelKind::Braid,
        }
    }
}

/// knobs that have to be fixed before the first bit is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmcOptions {
    pub model_kind: ModelKind,

    /// minimum count on the incoming edge before its successor is considered
    /// busy enough to clone
    pub cloning_threshold1: u32,

    /// minimum evidence the successor must have gathered from other edges
    pub cloning_threshold2: u32,
}

impl Default for DmcOptions {
    fn default() -> Self {
        DmcOptions {
            model_kind: ModelKind::default(),
            cloning_threshold1: DEFAULT_CLONING_THRESHOLD,
            cloning_threshold2: DEFAULT_CLONING_THRESHOLD,
        }
    }
}

#[test]
fn model_name_fallback() {
    assert_eq!(ModelKind::from_name("braid"), ModelKind::Braid);
    assert_eq!(ModelKind::from_name("byte"), ModelKind::Byte);
    assert_eq!(ModelKind::from_name("huffman"), ModelKind::Braid);
    assert_eq!(ModelKind::from_name(""), ModelKind::Braid);
}
