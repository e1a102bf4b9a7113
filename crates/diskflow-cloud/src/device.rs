//! Device path translation between provider and host naming

/// Maps device paths between the provider's convention and the host's.
///
/// The orchestrator treats the result as authoritative: `None` from
/// `to_host` means the provider exposed no usable device.
pub trait DeviceTranslator: Send + Sync {
    fn to_host(&self, provider_device: &str) -> Option<String>;

    fn to_provider(&self, host_device: &str) -> String;
}

/// Provider and host agree on device names
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDevices;

impl DeviceTranslator for IdentityDevices {
    fn to_host(&self, provider_device: &str) -> Option<String> {
        let device = provider_device.trim();
        if device.is_empty() {
            None
        } else {
            Some(device.to_string())
        }
    }

    fn to_provider(&self, host_device: &str) -> String {
        host_device.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_empty_device() {
        assert_eq!(IdentityDevices.to_host(""), None);
        assert_eq!(IdentityDevices.to_host("  "), None);
        assert_eq!(
            IdentityDevices.to_host("/dev/vdb"),
            Some("/dev/vdb".to_string())
        );
    }
}
