/// Errors reported by the simulator CLI.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No entry in the legacy mode table.
    #[error("Unknown legacy mode {0}")]
    UnknownMode(u8),

    /// No preset output mode for this mode number.
    #[error("No preset for mode {0}")]
    UnknownPreset(u8),

    /// A timing value doesn't fit the VIDC register encoding.
    #[error("Mode {mode}: {register} = {value} can't be encoded")]
    Unencodable {
        mode: u8,
        register: &'static str,
        value: u32,
    },

    /// The extended palette path is only driven from 8bpp modes.
    #[error("Mode {0} is not 8bpp, so has no hicolour variant")]
    HicolourDepth(u8),
}
