use sysinfo::Networks;

/// Network identity of this machine, reported to the tracking service when a
/// session starts.
pub trait MachineIdentity: Send + Sync {
    /// MAC address of the primary interface, or an empty string when none
    /// can be determined.
    fn mac_address(&self) -> String;
}

/// Reads interfaces from the OS every time it is asked, so a session started
/// after a network change reports the current hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdentity;

impl MachineIdentity for SystemIdentity {
    fn mac_address(&self) -> String {
        let networks = Networks::new_with_refreshed_list();
        let candidates = networks
            .iter()
            .map(|(name, data)| (name.clone(), data.mac_address().to_string()));
        let mac = pick_primary_mac(candidates).unwrap_or_default();
        if mac.is_empty() {
            log::warn!("No network interface with a hardware address found");
        }
        mac
    }
}

/// First interface (by name) with a usable hardware address. Loopback and
/// all-zero addresses are skipped.
pub fn pick_primary_mac<I>(interfaces: I) -> Option<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut usable: Vec<(String, String)> = interfaces
        .into_iter()
        .filter(|(name, mac)| name != "lo" && !name.starts_with("lo0") && !is_unspecified(mac))
        .collect();
    usable.sort_by(|a, b| a.0.cmp(&b.0));
    usable.into_iter().next().map(|(_, mac)| mac)
}

fn is_unspecified(mac: &str) -> bool {
    mac.is_empty() || mac.split(':').all(|octet| octet.chars().all(|c| c == '0'))
}
