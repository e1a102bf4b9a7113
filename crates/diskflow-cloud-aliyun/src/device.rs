//! ECS device naming

use diskflow_cloud::DeviceTranslator;

/// ECS reports Xen-style names (`/dev/xvdb`) that virtio guests see as `/dev/vdb`
#[derive(Debug, Clone, Copy, Default)]
pub struct XvdDevices;

impl DeviceTranslator for XvdDevices {
    fn to_host(&self, provider_device: &str) -> Option<String> {
        let device = provider_device.trim();
        if device.is_empty() {
            return None;
        }
        Some(match device.strip_prefix("/dev/xvd") {
            Some(suffix) if !suffix.is_empty() => format!("/dev/vd{}", suffix),
            _ => device.to_string(),
        })
    }

    fn to_provider(&self, host_device: &str) -> String {
        let device = host_device.trim();
        match device.strip_prefix("/dev/vd") {
            Some(suffix) if !suffix.is_empty() => format!("/dev/xvd{}", suffix),
            _ => device.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xvd_to_host() {
        assert_eq!(XvdDevices.to_host("/dev/xvdb"), Some("/dev/vdb".to_string()));
        assert_eq!(XvdDevices.to_host("/dev/sdc"), Some("/dev/sdc".to_string()));
        assert_eq!(XvdDevices.to_host(""), None);
    }

    #[test]
    fn test_host_to_provider() {
        assert_eq!(XvdDevices.to_provider("/dev/vdc"), "/dev/xvdc");
        assert_eq!(XvdDevices.to_provider("/dev/nvme1n1"), "/dev/nvme1n1");
    }
}
