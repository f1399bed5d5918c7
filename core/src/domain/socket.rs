//! Kernel TCP socket table model and row parser.
//!
//! `/proc/net/tcp` and `/proc/net/tcp6` share one layout: a header line, then
//! one whitespace-separated row per socket.
//!
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:0BB8 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 41532 1 ...
//! ```
//!
//! Addresses are hex words in host byte order; the port after the colon is
//! the plain hex value of the port number.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::Serialize;

// ============================================================================
// AddressFamily
// ============================================================================

/// Which socket table a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Both families, in scan order.
    pub const ALL: [AddressFamily; 2] = [AddressFamily::Ipv4, AddressFamily::Ipv6];

    /// Table path relative to the proc root.
    pub fn table_path(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "net/tcp",
            AddressFamily::Ipv6 => "net/tcp6",
        }
    }

    /// Number of hex digits in the address part of a local address field.
    fn address_hex_len(&self) -> usize {
        match self {
            AddressFamily::Ipv4 => 8,
            AddressFamily::Ipv6 => 32,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "tcp"),
            AddressFamily::Ipv6 => write!(f, "tcp6"),
        }
    }
}

// ============================================================================
// TcpState
// ============================================================================

/// TCP connection states as numbered by the kernel (`include/net/tcp_states.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
}

impl TcpState {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => TcpState::Established,
            0x02 => TcpState::SynSent,
            0x03 => TcpState::SynRecv,
            0x04 => TcpState::FinWait1,
            0x05 => TcpState::FinWait2,
            0x06 => TcpState::TimeWait,
            0x07 => TcpState::Close,
            0x08 => TcpState::CloseWait,
            0x09 => TcpState::LastAck,
            0x0A => TcpState::Listen,
            0x0B => TcpState::Closing,
            _ => return None,
        })
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TcpState::Established => "ESTABLISHED",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynRecv => "SYN_RECV",
            TcpState::FinWait1 => "FIN_WAIT1",
            TcpState::FinWait2 => "FIN_WAIT2",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::Close => "CLOSE",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
            TcpState::Listen => "LISTEN",
            TcpState::Closing => "CLOSING",
        }
    }
}

impl std::fmt::Display for TcpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// SocketRow
// ============================================================================

/// The fields of one socket table row that the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketRow {
    pub address: IpAddr,
    pub port: u16,
    pub state: TcpState,
    pub inode: u64,
}

// Column positions after splitting on whitespace.
const LOCAL_ADDRESS_COL: usize = 1;
const STATE_COL: usize = 3;
const INODE_COL: usize = 9;

impl SocketRow {
    /// Parse one data row. Returns `None` for anything malformed.
    pub fn parse(line: &str, family: AddressFamily) -> Option<Self> {
        let mut cols = line.split_whitespace();
        let local = cols.nth(LOCAL_ADDRESS_COL)?;
        let state = cols.nth(STATE_COL - LOCAL_ADDRESS_COL - 1)?;
        let inode = cols.nth(INODE_COL - STATE_COL - 1)?;

        let (address, port) = parse_local_address(local, family)?;
        let state = TcpState::from_code(parse_hex_u8(state)?)?;
        let inode = inode.parse().ok()?;

        Some(Self {
            address,
            port,
            state,
            inode,
        })
    }

    /// Keep listening rows bound to a real port. An inode of 0 still counts
    /// as a listener; it just never resolves to an owner.
    pub fn into_listening(self, family: AddressFamily) -> Option<ListeningSocket> {
        (self.state == TcpState::Listen && self.port != 0).then_some(ListeningSocket {
            port: self.port,
            inode: self.inode,
            address: self.address,
            family,
        })
    }
}

fn parse_hex_u8(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

/// Decode `ADDRESS:PORT` where both halves are hex.
fn parse_local_address(field: &str, family: AddressFamily) -> Option<(IpAddr, u16)> {
    let (addr_hex, port_hex) = field.split_once(':')?;
    if addr_hex.len() != family.address_hex_len() || port_hex.is_empty() || port_hex.len() > 4 {
        return None;
    }
    let port = u16::from_str_radix(port_hex, 16).ok()?;

    // Each 32-bit word is the network-order bytes read as a host integer.
    let mut bytes = [0u8; 16];
    for (i, word) in addr_hex.as_bytes().chunks(8).enumerate() {
        let word = std::str::from_utf8(word).ok()?;
        let value = u32::from_str_radix(word, 16).ok()?;
        bytes[i * 4..i * 4 + 4].copy_from_slice(&value.to_ne_bytes());
    }

    let address = match family {
        AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])),
        AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::from(bytes)),
    };
    Some((address, port))
}

// ============================================================================
// ListeningSocket
// ============================================================================

/// A socket in the LISTEN state, identified by its inode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ListeningSocket {
    pub port: u16,
    pub inode: u64,
    pub address: IpAddr,
    pub family: AddressFamily,
}

impl ListeningSocket {
    /// The string a descriptor symlink resolves to when it refers to this socket.
    pub fn descriptor_target(&self) -> String {
        socket_descriptor_target(self.inode)
    }
}

/// `socket:[<inode>]`, the canonical descriptor target for a socket.
pub fn socket_descriptor_target(inode: u64) -> String {
    format!("socket:[{}]", inode)
}

/// Inverse of [`socket_descriptor_target`].
pub fn parse_socket_descriptor_target(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Lazily parse a socket table, yielding listening sockets only.
///
/// The first line is always treated as the header. Malformed rows are skipped
/// one at a time.
pub fn listening_sockets(
    table: &str,
    family: AddressFamily,
) -> impl Iterator<Item = ListeningSocket> + '_ {
    table
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(move |line| {
            let row = SocketRow::parse(line, family);
            if row.is_none() {
                tracing::trace!(%family, line, "Skipping malformed socket row");
            }
            row?.into_listening(family)
        })
}

/// Parse a whole socket table, keeping listening sockets only.
pub fn parse_listening_table(table: &str, family: AddressFamily) -> Vec<ListeningSocket> {
    listening_sockets(table, family).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    fn v4_row(sl: u32, local: &str, state: &str, inode: u64) -> String {
        format!(
            "{:>4}: {} 00000000:0000 {} 00000000:00000000 00:00000000 00000000  1000        0 {} 1 0000000000000000 100 0 0 10 0",
            sl, local, state, inode
        )
    }

    fn loopback_hex() -> String {
        format!("{:08X}", u32::from_ne_bytes([127, 0, 0, 1]))
    }

    #[test]
    fn test_parse_listening_row() {
        let line = v4_row(0, &format!("{}:0BB8", loopback_hex()), "0A", 41532);
        let row = SocketRow::parse(&line, AddressFamily::Ipv4).unwrap();
        assert_eq!(row.port, 3000);
        assert_eq!(row.state, TcpState::Listen);
        assert_eq!(row.inode, 41532);
        assert_eq!(row.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_port_is_not_byte_swapped() {
        // 0x1F90 == 8080
        let line = v4_row(1, "00000000:1F90", "0A", 7);
        let row = SocketRow::parse(&line, AddressFamily::Ipv4).unwrap();
        assert_eq!(row.port, 8080);
        assert_eq!(row.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_parse_ipv6_any() {
        let line = "   0: 00000000000000000000000000000000:1F90 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 99 1 0000000000000000 100 0 0 10 0";
        let row = SocketRow::parse(line, AddressFamily::Ipv6).unwrap();
        assert_eq!(row.port, 8080);
        assert_eq!(row.address, IpAddr::V6(Ipv6Addr::UNSPECIFIED));
        assert_eq!(row.inode, 99);
    }

    #[test]
    fn test_parse_ipv6_loopback() {
        let words: String = Ipv6Addr::LOCALHOST
            .octets()
            .chunks(4)
            .map(|w| format!("{:08X}", u32::from_ne_bytes([w[0], w[1], w[2], w[3]])))
            .collect();
        let line = format!(
            "   3: {}:0050 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 123 1",
            words
        );
        let row = SocketRow::parse(&line, AddressFamily::Ipv6).unwrap();
        assert_eq!(row.address, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(row.port, 80);
    }

    #[test]
    fn test_family_mismatch_is_malformed() {
        let line = v4_row(0, "00000000:0BB8", "0A", 5);
        assert!(SocketRow::parse(&line, AddressFamily::Ipv6).is_none());
    }

    #[test]
    fn test_malformed_rows() {
        assert!(SocketRow::parse("", AddressFamily::Ipv4).is_none());
        assert!(SocketRow::parse("   0: 0100007F:0BB8 00000000:0000 0A", AddressFamily::Ipv4).is_none());
        assert!(SocketRow::parse(&v4_row(0, "0100007F:ZZZZ", "0A", 5), AddressFamily::Ipv4).is_none());
        assert!(SocketRow::parse(&v4_row(0, "0100007F0BB8", "0A", 5), AddressFamily::Ipv4).is_none());
        assert!(SocketRow::parse(&v4_row(0, "0100007F:0BB8", "0Q", 5), AddressFamily::Ipv4).is_none());
        assert!(SocketRow::parse(&v4_row(0, "0100007F:0BB8", "FF", 5), AddressFamily::Ipv4).is_none());
        let bad_inode = v4_row(0, "0100007F:0BB8", "0A", 5).replace(" 5 1 ", " x 1 ");
        assert!(SocketRow::parse(&bad_inode, AddressFamily::Ipv4).is_none());
    }

    #[test]
    fn test_parse_table_keeps_only_listeners() {
        let table = [
            TCP_HEADER.to_string(),
            v4_row(0, "00000000:0016", "0A", 1001),
            v4_row(1, "0100007F:0BB8", "01", 1002),
            "   2: this row is garbage".to_string(),
            v4_row(3, "0100007F:1F90", "0A", 1003),
            v4_row(4, "0100007F:1F91", "06", 0),
            String::new(),
        ]
        .join("\n");

        let sockets = parse_listening_table(&table, AddressFamily::Ipv4);
        let ports: Vec<(u16, u64)> = sockets.iter().map(|s| (s.port, s.inode)).collect();
        assert_eq!(ports, vec![(22, 1001), (8080, 1003)]);
        assert!(sockets.iter().all(|s| s.family == AddressFamily::Ipv4));
    }

    #[test]
    fn test_header_is_always_discarded() {
        // Even a header that happens to parse as a row is dropped.
        let table = format!(
            "{}\n{}",
            v4_row(0, "00000000:0016", "0A", 1),
            v4_row(1, "00000000:0017", "0A", 2)
        );
        let sockets = parse_listening_table(&table, AddressFamily::Ipv4);
        assert_eq!(sockets.len(), 1);
        assert_eq!(sockets[0].port, 23);
    }

    #[test]
    fn test_listening_row_without_inode_is_kept() {
        let line = v4_row(0, "00000000:0016", "0A", 0);
        let row = SocketRow::parse(&line, AddressFamily::Ipv4).unwrap();
        let socket = row.into_listening(AddressFamily::Ipv4).unwrap();
        assert_eq!(socket.port, 22);
        assert_eq!(socket.inode, 0);
    }

    #[test]
    fn test_listening_row_on_port_zero_is_dropped() {
        let line = v4_row(0, "00000000:0000", "0A", 77);
        let row = SocketRow::parse(&line, AddressFamily::Ipv4).unwrap();
        assert!(row.into_listening(AddressFamily::Ipv4).is_none());
    }

    #[test]
    fn test_descriptor_target_roundtrip() {
        assert_eq!(socket_descriptor_target(41532), "socket:[41532]");
        assert_eq!(parse_socket_descriptor_target("socket:[41532]"), Some(41532));
        assert_eq!(parse_socket_descriptor_target("pipe:[41532]"), None);
        assert_eq!(parse_socket_descriptor_target("/dev/null"), None);
        assert_eq!(parse_socket_descriptor_target("socket:[]"), None);
    }

    #[test]
    fn test_tcp_state_codes() {
        assert_eq!(TcpState::from_code(0x0A), Some(TcpState::Listen));
        assert_eq!(TcpState::from_code(0x01), Some(TcpState::Established));
        assert_eq!(TcpState::from_code(0x00), None);
        assert_eq!(TcpState::Listen.to_string(), "LISTEN");
    }
}
