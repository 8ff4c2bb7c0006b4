//! Mount-table text source.
//!
//! The grammar flavor is selected once, at startup. Only the Linux `mount`
//! output grammar is implemented; asking for the BSD flavor is a named
//! error, never a misparse. An empty table is its own failure here so the
//! mount check can distinguish "nothing is mounted there" from "the probe
//! saw nothing at all".

use super::{run_capture, ProbeError};

/// Which mount-table grammar to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountFlavor {
    Linux,
    Bsd,
}

/// Raw mount-table text, one mount per line.
pub fn read_table(flavor: MountFlavor) -> Result<String, ProbeError> {
    match flavor {
        MountFlavor::Bsd => Err(ProbeError::Unsupported("the BSD mount table grammar")),
        MountFlavor::Linux => {
            let text = run_capture("mount", &[])?;
            if text.trim().is_empty() {
                return Err(ProbeError::EmptyOutput { tool: "mount" });
            }
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bsd_flavor_refused_before_probing() {
        let err = read_table(MountFlavor::Bsd).unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));
        assert_eq!(err.to_string(), "the BSD mount table grammar is not supported");
    }
}
