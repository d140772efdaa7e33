use std::fmt;

/// Lexical classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    #[default]
    Unknown,
    /// A fixed literal.
    Literal,
    /// A timestamp in one of the formats compiled into the time FSM.
    Timestamp,
    /// An IPv4 address in the form a.b.c.d.
    Ipv4,
    /// Reserved; IPv6 addresses are not lexed.
    Ipv6,
    /// An integer number.
    Integer,
    /// A floating point number.
    Float,
    /// A URL starting with http:// or https://.
    Url,
    /// A colon-separated MAC address.
    Mac,
    /// A free string standing for multiple possible values.
    String,
}

/// Semantic classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    #[default]
    Unknown,
    MsgType,
    MsgClass,
    RecvTime,
    CreateTime,
    Severity,
    Priority,
    AppHost,
    AppIpv4,
    AppName,
    AppType,
    SrcDomain,
    SrcZone,
    SrcHost,
    SrcIpv4,
    SrcIpv4Nat,
    SrcIpv6,
    SrcPort,
    SrcPortNat,
    SrcMac,
    SrcUser,
    SrcEmail,
    DstDomain,
    DstZone,
    DstHost,
    DstIpv4,
    DstIpv4Nat,
    DstIpv6,
    DstPort,
    DstPortNat,
    DstMac,
    DstUser,
    DstEmail,
    Protocol,
    InIface,
    OutIface,
    PolicyId,
    SessionId,
    Object,
    Action,
    Method,
    MethodType,
    Status,
    Reason,
    BytesRecv,
    BytesSent,
    PktsRecv,
    PktsSent,
    Duration,
}

pub(crate) const NUM_TOKEN_KINDS: usize = TokenKind::String as usize + 1;
pub(crate) const NUM_FIELD_KINDS: usize = FieldKind::Duration as usize + 1;

/// Leading slots at every analyzer trie level reserved for field and token
/// kinds; literal nodes are appended after this prefix.
pub(crate) const MIN_FIXED_SLOTS: usize = NUM_FIELD_KINDS + NUM_TOKEN_KINDS;

pub(crate) const PARTIAL_MATCH_WEIGHT: i32 = 1;
pub(crate) const FULL_MATCH_WEIGHT: i32 = 2;

impl TokenKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            TokenKind::Unknown => "%tunknown%",
            TokenKind::Literal => "%literal%",
            TokenKind::Timestamp => "%ts%",
            TokenKind::Ipv4 => "%ipv4%",
            TokenKind::Ipv6 => "%ipv6%",
            TokenKind::Integer => "%integer%",
            TokenKind::Float => "%float%",
            TokenKind::Url => "%url%",
            TokenKind::Mac => "%mac%",
            TokenKind::String => "%string%",
        }
    }

    /// Resolves a kind placeholder. `%time%` is the older spelling of `%ts%`.
    pub fn from_placeholder(name: &str) -> TokenKind {
        match name {
            "%literal%" => TokenKind::Literal,
            "%ts%" | "%time%" => TokenKind::Timestamp,
            "%ipv4%" => TokenKind::Ipv4,
            "%ipv6%" => TokenKind::Ipv6,
            "%integer%" => TokenKind::Integer,
            "%float%" => TokenKind::Float,
            "%url%" => TokenKind::Url,
            "%mac%" => TokenKind::Mac,
            "%string%" => TokenKind::String,
            _ => TokenKind::Unknown,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

impl FieldKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            FieldKind::Unknown => "%funknown%",
            FieldKind::MsgType => "%msgtype%",
            FieldKind::MsgClass => "%msgclass%",
            FieldKind::RecvTime => "%recvtime%",
            FieldKind::CreateTime => "%createtime%",
            FieldKind::Severity => "%severity%",
            FieldKind::Priority => "%priority%",
            FieldKind::AppHost => "%apphost%",
            FieldKind::AppIpv4 => "%appipv4%",
            FieldKind::AppName => "%appname%",
            FieldKind::AppType => "%apptype%",
            FieldKind::SrcDomain => "%srcdomain%",
            FieldKind::SrcZone => "%srczone%",
            FieldKind::SrcHost => "%srchost%",
            FieldKind::SrcIpv4 => "%srcipv4%",
            FieldKind::SrcIpv4Nat => "%srcipv4nat%",
            FieldKind::SrcIpv6 => "%srcipv6%",
            FieldKind::SrcPort => "%srcport%",
            FieldKind::SrcPortNat => "%srcportnat%",
            FieldKind::SrcMac => "%srcmac%",
            FieldKind::SrcUser => "%srcuser%",
            FieldKind::SrcEmail => "%srcemail%",
            FieldKind::DstDomain => "%dstdomain%",
            FieldKind::DstZone => "%dstzone%",
            FieldKind::DstHost => "%dsthost%",
            FieldKind::DstIpv4 => "%dstipv4%",
            FieldKind::DstIpv4Nat => "%dstipv4nat%",
            FieldKind::DstIpv6 => "%dstipv6%",
            FieldKind::DstPort => "%dstport%",
            FieldKind::DstPortNat => "%dstportnat%",
            FieldKind::DstMac => "%dstmac%",
            FieldKind::DstUser => "%dstuser%",
            FieldKind::DstEmail => "%dstemail%",
            FieldKind::Protocol => "%protocol%",
            FieldKind::InIface => "%iniface%",
            FieldKind::OutIface => "%outiface%",
            FieldKind::PolicyId => "%policyid%",
            FieldKind::SessionId => "%sessionid%",
            FieldKind::Object => "%object%",
            FieldKind::Action => "%action%",
            FieldKind::Method => "%method%",
            FieldKind::MethodType => "%methodtype%",
            FieldKind::Status => "%status%",
            FieldKind::Reason => "%reason%",
            FieldKind::BytesRecv => "%bytesrecv%",
            FieldKind::BytesSent => "%bytessent%",
            FieldKind::PktsRecv => "%pktsrecv%",
            FieldKind::PktsSent => "%pktssent%",
            FieldKind::Duration => "%duration%",
        }
    }

    pub fn from_placeholder(name: &str) -> FieldKind {
        match name {
            "%msgtype%" => FieldKind::MsgType,
            "%msgclass%" => FieldKind::MsgClass,
            "%recvtime%" => FieldKind::RecvTime,
            "%createtime%" => FieldKind::CreateTime,
            "%severity%" => FieldKind::Severity,
            "%priority%" => FieldKind::Priority,
            "%apphost%" => FieldKind::AppHost,
            "%appipv4%" => FieldKind::AppIpv4,
            "%appname%" => FieldKind::AppName,
            "%apptype%" => FieldKind::AppType,
            "%srcdomain%" => FieldKind::SrcDomain,
            "%srczone%" => FieldKind::SrcZone,
            "%srchost%" => FieldKind::SrcHost,
            "%srcipv4%" => FieldKind::SrcIpv4,
            "%srcipv4nat%" => FieldKind::SrcIpv4Nat,
            "%srcipv6%" => FieldKind::SrcIpv6,
            "%srcport%" => FieldKind::SrcPort,
            "%srcportnat%" => FieldKind::SrcPortNat,
            "%srcmac%" => FieldKind::SrcMac,
            "%srcuser%" => FieldKind::SrcUser,
            "%srcemail%" => FieldKind::SrcEmail,
            "%dstdomain%" => FieldKind::DstDomain,
            "%dstzone%" => FieldKind::DstZone,
            "%dsthost%" => FieldKind::DstHost,
            "%dstipv4%" => FieldKind::DstIpv4,
            "%dstipv4nat%" => FieldKind::DstIpv4Nat,
            "%dstipv6%" => FieldKind::DstIpv6,
            "%dstport%" => FieldKind::DstPort,
            "%dstportnat%" => FieldKind::DstPortNat,
            "%dstmac%" => FieldKind::DstMac,
            "%dstuser%" => FieldKind::DstUser,
            "%dstemail%" => FieldKind::DstEmail,
            "%protocol%" => FieldKind::Protocol,
            "%iniface%" => FieldKind::InIface,
            "%outiface%" => FieldKind::OutIface,
            "%policyid%" => FieldKind::PolicyId,
            "%sessionid%" => FieldKind::SessionId,
            "%object%" => FieldKind::Object,
            "%action%" => FieldKind::Action,
            "%method%" => FieldKind::Method,
            "%methodtype%" => FieldKind::MethodType,
            "%status%" => FieldKind::Status,
            "%reason%" => FieldKind::Reason,
            "%bytesrecv%" => FieldKind::BytesRecv,
            "%bytessent%" => FieldKind::BytesSent,
            "%pktsrecv%" => FieldKind::PktsRecv,
            "%pktssent%" => FieldKind::PktsSent,
            "%duration%" => FieldKind::Duration,
            _ => FieldKind::Unknown,
        }
    }

    /// The token kind a value of this field always carries.
    pub fn token_kind(self) -> TokenKind {
        match self {
            FieldKind::Unknown => TokenKind::Unknown,
            FieldKind::MsgType
            | FieldKind::Severity
            | FieldKind::Priority
            | FieldKind::SrcPort
            | FieldKind::SrcPortNat
            | FieldKind::DstPort
            | FieldKind::DstPortNat
            | FieldKind::PolicyId
            | FieldKind::SessionId
            | FieldKind::BytesRecv
            | FieldKind::BytesSent
            | FieldKind::PktsRecv
            | FieldKind::PktsSent => TokenKind::Integer,
            FieldKind::RecvTime | FieldKind::CreateTime => TokenKind::Timestamp,
            FieldKind::AppIpv4
            | FieldKind::SrcIpv4
            | FieldKind::SrcIpv4Nat
            | FieldKind::DstIpv4
            | FieldKind::DstIpv4Nat => TokenKind::Ipv4,
            FieldKind::SrcIpv6 | FieldKind::DstIpv6 => TokenKind::Ipv6,
            FieldKind::SrcMac | FieldKind::DstMac => TokenKind::Mac,
            _ => TokenKind::String,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

/// A piece of information extracted from a log message.
///
/// The scanner fills in the kind; the field stays unknown unless the surface
/// value was a `%...%` placeholder naming a known field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub field: FieldKind,
    /// The extracted surface value. Lower-cased for mac, url, timestamp and
    /// literal tokens.
    pub value: String,
    /// Whether this token is the key of a key=value pair.
    pub is_key: bool,
    /// Whether this token is the value of a key=value pair.
    pub is_value: bool,
    /// Number of adjacent input tokens a field placeholder consumes during
    /// parsing. 0 or 1 means a single token.
    pub range: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Token {
        Token {
            kind,
            value: value.into(),
            ..Token::default()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ field={}, kind={}, value={:?}, key={}, value_of_pair={}, range={} }}",
            self.field, self.kind, self.value, self.is_key, self.is_value, self.range
        )
    }
}

/// Scores a trie node token against an input token.
///
/// Returns the match weight, or `None` when the node cannot stand for the
/// input at this position:
/// 1. same non-literal kind: full match;
/// 2. free-string node over a literal that is multi-character or a single
///    letter: partial match;
/// 3. equal literal values: full match;
/// 4. a free-string key=value value matches any node: full match.
pub(crate) fn match_weight(node: &Token, input: &Token) -> Option<i32> {
    if node.kind == input.kind && input.kind != TokenKind::Literal {
        Some(FULL_MATCH_WEIGHT)
    } else if node.kind == TokenKind::String
        && input.kind == TokenKind::Literal
        && (input.value.len() != 1 || input.value.as_bytes()[0].is_ascii_alphabetic())
    {
        Some(PARTIAL_MATCH_WEIGHT)
    } else if node.kind == TokenKind::Literal
        && input.kind == TokenKind::Literal
        && node.value == input.value
    {
        Some(FULL_MATCH_WEIGHT)
    } else if input.kind == TokenKind::String && input.is_value {
        Some(FULL_MATCH_WEIGHT)
    } else {
        None
    }
}
