//! Platform enumeration and queries.

use crate::packets::simple::{id_param_packet, signal_packet};

signal_packet!(
    /// Requests the platform ID list; answered with an `IdList`.
    GetPlatformIds,
    GetPlatformIDs
);

id_param_packet!(
    /// A platform info query; answered with a payload.
    GetPlatformInfo,
    GetPlatformInfo
);
