// ── Domain model ──
//
// Devices as the session layer sees them: typed, with their parent base
// station resolved, built fresh from each login's inventory.

pub mod device;
pub mod registry;

pub use device::{Device, DeviceKind};
pub use registry::DeviceRegistry;
