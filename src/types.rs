use serde::{Deserialize, Serialize};

/// A captured application-layer message, after transport-header stripping.
///
/// Any finite byte sequence is a valid payload; the crate never rejects one.
pub type Payload = Vec<u8>;

/// Canonical identifier of a bidirectional conversation.
///
/// Demultiplexing packets into flows and choosing the canonical (usually
/// unordered) 4-tuple ordering is the responsibility of the external
/// [`FlowSource`][crate::source::FlowSource] collaborator; this type only
/// carries whatever the collaborator decided on.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub src_addr: String,
    pub src_port: u16,
    pub dst_addr: String,
    pub dst_port: u16,
}

impl FlowKey {
    /// Builds a flow key from its four components.
    pub fn new(
        src_addr: impl Into<String>,
        src_port: u16,
        dst_addr: impl Into<String>,
        dst_port: u16,
    ) -> Self {
        FlowKey {
            src_addr: src_addr.into(),
            src_port,
            dst_addr: dst_addr.into(),
            dst_port,
        }
    }
}

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}",
            self.src_addr, self.src_port, self.dst_addr, self.dst_port
        )
    }
}

/// A byte is printable iff it falls in the ASCII range `[0x20, 0x7E]`.
pub fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Decodes a little-endian `u32` from exactly 4 bytes.
///
/// Panics if `bytes.len() != 4`; callers are expected to have already
/// checked remaining length before calling this.
pub fn u32_from_le_bytes(bytes: &[u8]) -> u32 {
    let arr: [u8; 4] = bytes.try_into().expect("caller must supply exactly 4 bytes");
    u32::from_le_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_boundaries() {
        assert!(!is_printable(0x1F));
        assert!(is_printable(0x20));
        assert!(is_printable(0x7E));
        assert!(!is_printable(0x7F));
    }

    #[test]
    fn le_decode() {
        assert_eq!(u32_from_le_bytes(&[0x10, 0x00, 0x00, 0x00]), 16);
    }

    #[test]
    fn flow_key_display() {
        let k = FlowKey::new("10.0.0.1", 502, "10.0.0.2", 51000);
        assert_eq!(k.to_string(), "10.0.0.1:502->10.0.0.2:51000");
    }
}
