//! Video encoder profiles, capability probing, and selection.

pub mod codec;
pub mod policy;
pub mod probe;
pub mod select;

pub use codec::{Codec, EncoderSpec};
pub use policy::{ExitPolicy, LenientExitPolicy};
pub use probe::{EncoderId, EncoderInventory, EncoderProber, ProbeTimeouts};
pub use select::{EncoderSelector, get_encoder_params};
