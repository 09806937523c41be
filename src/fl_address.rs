//! MAC-48 and IPv4 address allocation for simulated devices.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::fl_error::{FlError, Result};

/// Narrowest prefix the IPv4 allocator may widen to
const MIN_PREFIX: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mac48(pub [u8; 6]);

impl Mac48 {
    fn from_u64(value: u64) -> Self {
        let b = value.to_be_bytes();
        Mac48([b[2], b[3], b[4], b[5], b[6], b[7]])
    }
}

impl fmt::Display for Mac48 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Sequential MAC addresses starting at 00:00:00:00:00:01
#[derive(Debug, Clone)]
pub struct MacAllocator {
    next: u64,
}

impl MacAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> Mac48 {
        let mac = Mac48::from_u64(self.next);
        self.next += 1;
        mac
    }
}

impl Default for MacAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Network base and mask devices are numbered from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingConfig {
    pub base: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            base: Ipv4Addr::new(10, 1, 3, 0),
            mask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }
}

impl AddressingConfig {
    pub fn prefix_len(&self) -> Result<u8> {
        let mask = u32::from(self.mask);
        if mask.leading_ones() != mask.count_ones() {
            return Err(FlError::invalid(
                "addressing.mask",
                format!("{} is not a contiguous netmask", self.mask),
            ));
        }
        Ok(mask.count_ones() as u8)
    }
}

/// Hands out host addresses `.1, .2, ...` within one network
#[derive(Debug, Clone)]
pub struct Ipv4Allocator {
    network: u32,
    prefix: u8,
    next_host: u32,
}

fn host_capacity(prefix: u8) -> u64 {
    // network and broadcast addresses are not assignable
    (1u64 << (32 - prefix as u32)).saturating_sub(2)
}

fn network_of(addr: u32, prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        addr & (u32::MAX << (32 - prefix as u32))
    }
}

impl Ipv4Allocator {
    pub fn new(base: Ipv4Addr, prefix: u8) -> Self {
        Self {
            network: network_of(u32::from(base), prefix),
            prefix,
            next_host: 1,
        }
    }

    /// Allocator for `hosts` addresses. Keeps `prefix` when it is big
    /// enough, otherwise widens to the smallest prefix that fits and aligns
    /// the base to it.
    pub fn fitting(base: Ipv4Addr, prefix: u8, hosts: usize) -> Result<Self> {
        let mut fit = prefix.min(30);
        while host_capacity(fit) < hosts as u64 {
            if fit <= MIN_PREFIX {
                return Err(FlError::AddressExhausted {
                    base,
                    prefix,
                    needed: hosts,
                });
            }
            fit -= 1;
        }
        Ok(Self::new(base, fit))
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn allocate(&mut self) -> Result<Ipv4Addr> {
        if self.next_host as u64 > host_capacity(self.prefix) {
            return Err(FlError::AddressExhausted {
                base: self.network(),
                prefix: self.prefix,
                needed: self.next_host as usize,
            });
        }
        let addr = Ipv4Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_sequence() {
        let mut macs = MacAllocator::new();
        assert_eq!(macs.allocate().to_string(), "00:00:00:00:00:01");
        assert_eq!(macs.allocate().to_string(), "00:00:00:00:00:02");
        for _ in 0..253 {
            macs.allocate();
        }
        assert_eq!(macs.allocate().to_string(), "00:00:00:00:01:00");
    }

    #[test]
    fn test_ipv4_sequence() {
        let mut ips = Ipv4Allocator::new(Ipv4Addr::new(10, 1, 3, 0), 24);
        assert_eq!(ips.allocate().unwrap(), Ipv4Addr::new(10, 1, 3, 1));
        assert_eq!(ips.allocate().unwrap(), Ipv4Addr::new(10, 1, 3, 2));
    }

    #[test]
    fn test_ipv4_exhaustion() {
        let mut ips = Ipv4Allocator::new(Ipv4Addr::new(10, 1, 3, 0), 30);
        assert!(ips.allocate().is_ok());
        assert!(ips.allocate().is_ok());
        assert!(matches!(
            ips.allocate(),
            Err(FlError::AddressExhausted { .. })
        ));
    }

    #[test]
    fn test_fitting_keeps_prefix_when_large_enough() {
        let ips = Ipv4Allocator::fitting(Ipv4Addr::new(10, 1, 3, 0), 24, 101).unwrap();
        assert_eq!(ips.prefix(), 24);
        assert_eq!(ips.network(), Ipv4Addr::new(10, 1, 3, 0));
    }

    #[test]
    fn test_fitting_widens_for_default_topology() {
        // 500 stations + 1 access point
        let mut ips = Ipv4Allocator::fitting(Ipv4Addr::new(10, 1, 3, 0), 24, 501).unwrap();
        assert_eq!(ips.prefix(), 23);
        assert_eq!(ips.network(), Ipv4Addr::new(10, 1, 2, 0));

        let all: Vec<Ipv4Addr> = (0..501).map(|_| ips.allocate().unwrap()).collect();
        assert_eq!(all[0], Ipv4Addr::new(10, 1, 2, 1));
        assert_eq!(all[500], Ipv4Addr::new(10, 1, 3, 245));
    }

    #[test]
    fn test_fitting_gives_up_past_slash_8() {
        let result = Ipv4Allocator::fitting(Ipv4Addr::new(10, 0, 0, 0), 24, 1 << 25);
        assert!(matches!(result, Err(FlError::AddressExhausted { .. })));
    }

    #[test]
    fn test_prefix_len() {
        assert_eq!(AddressingConfig::default().prefix_len().unwrap(), 24);
        let bad = AddressingConfig {
            mask: Ipv4Addr::new(255, 0, 255, 0),
            ..Default::default()
        };
        assert!(bad.prefix_len().is_err());
    }
}
