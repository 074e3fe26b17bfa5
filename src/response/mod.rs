//! Numeric replies the session interprets.
//!
//! Only numerics with a handler are listed; anything else is still raised as
//! a generic numeric event but never touches the model.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

/// A numeric reply code with a dedicated handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Registration ===
    /// 001 - Welcome; confirms our nick
    RPL_WELCOME = 1,
    /// 004 - Server name, version, user modes, channel modes
    RPL_MYINFO = 4,
    /// 005 - ISUPPORT tokens
    RPL_ISUPPORT = 5,

    // === Own state ===
    /// 221 - Our user modes
    RPL_UMODEIS = 221,
    /// 305 - No longer away
    RPL_UNAWAY = 305,
    /// 306 - Now away
    RPL_NOWAWAY = 306,

    // === LUSERS ===
    /// 251 - Users/services/servers
    RPL_LUSERCLIENT = 251,
    /// 252 - Operators online
    RPL_LUSEROP = 252,
    /// 253 - Unknown connections
    RPL_LUSERUNKNOWN = 253,
    /// 254 - Channels formed
    RPL_LUSERCHANNELS = 254,
    /// 255 - Local clients and servers
    RPL_LUSERME = 255,
    /// 265 - Local users, current and max
    RPL_LOCALUSERS = 265,
    /// 266 - Global users, current and max
    RPL_GLOBALUSERS = 266,

    // === WHOIS family ===
    /// 301 - User is away
    RPL_AWAY = 301,
    /// 302 - USERHOST reply
    RPL_USERHOST = 302,
    /// 303 - ISON reply
    RPL_ISON = 303,
    /// 307 - Nick is registered
    RPL_WHOISREGNICK = 307,
    /// 311 - WHOIS user line
    RPL_WHOISUSER = 311,
    /// 312 - WHOIS server
    RPL_WHOISSERVER = 312,
    /// 313 - WHOIS operator
    RPL_WHOISOPERATOR = 313,
    /// 317 - WHOIS idle and signon
    RPL_WHOISIDLE = 317,
    /// 318 - End of WHOIS
    RPL_ENDOFWHOIS = 318,
    /// 319 - WHOIS channels
    RPL_WHOISCHANNELS = 319,
    /// 330 - WHOIS account
    RPL_WHOISACCOUNT = 330,
    /// 379 - WHOIS user modes (Unreal)
    RPL_WHOISMODES = 379,
    /// 671 - WHOIS secure connection
    RPL_WHOISSECURE = 671,

    // === Channel state ===
    /// 324 - Channel modes
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time
    RPL_CREATIONTIME = 329,
    /// 331 - No topic
    RPL_NOTOPIC = 331,
    /// 332 - Topic text
    RPL_TOPIC = 332,
    /// 333 - Topic setter and time
    RPL_TOPICWHOTIME = 333,
    /// 346 - Invite exception list entry
    RPL_INVITELIST = 346,
    /// 348 - Exception list entry
    RPL_EXCEPTLIST = 348,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 367 - Ban list entry
    RPL_BANLIST = 367,

    // === MOTD and misc ===
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - MOTD end
    RPL_ENDOFMOTD = 376,
    /// 391 - Server time
    RPL_TIME = 391,
    /// 422 - No MOTD
    ERR_NOMOTD = 422,

    // === Errors ===
    /// 401 - No such nick
    ERR_NOSUCHNICK = 401,
    /// 433 - Nick in use
    ERR_NICKNAMEINUSE = 433,
}

impl Response {
    /// Numeric value.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Look up a handled numeric.
    pub fn from_code(code: u16) -> Option<Response> {
        use Response::*;
        Some(match code {
            1 => RPL_WELCOME,
            4 => RPL_MYINFO,
            5 => RPL_ISUPPORT,
            221 => RPL_UMODEIS,
            251 => RPL_LUSERCLIENT,
            252 => RPL_LUSEROP,
            253 => RPL_LUSERUNKNOWN,
            254 => RPL_LUSERCHANNELS,
            255 => RPL_LUSERME,
            265 => RPL_LOCALUSERS,
            266 => RPL_GLOBALUSERS,
            301 => RPL_AWAY,
            302 => RPL_USERHOST,
            303 => RPL_ISON,
            305 => RPL_UNAWAY,
            306 => RPL_NOWAWAY,
            307 => RPL_WHOISREGNICK,
            311 => RPL_WHOISUSER,
            312 => RPL_WHOISSERVER,
            313 => RPL_WHOISOPERATOR,
            317 => RPL_WHOISIDLE,
            318 => RPL_ENDOFWHOIS,
            319 => RPL_WHOISCHANNELS,
            324 => RPL_CHANNELMODEIS,
            329 => RPL_CREATIONTIME,
            330 => RPL_WHOISACCOUNT,
            331 => RPL_NOTOPIC,
            332 => RPL_TOPIC,
            333 => RPL_TOPICWHOTIME,
            346 => RPL_INVITELIST,
            348 => RPL_EXCEPTLIST,
            352 => RPL_WHOREPLY,
            353 => RPL_NAMREPLY,
            367 => RPL_BANLIST,
            372 => RPL_MOTD,
            375 => RPL_MOTDSTART,
            376 => RPL_ENDOFMOTD,
            379 => RPL_WHOISMODES,
            391 => RPL_TIME,
            401 => ERR_NOSUCHNICK,
            422 => ERR_NOMOTD,
            433 => ERR_NICKNAMEINUSE,
            671 => RPL_WHOISSECURE,
            _ => return None,
        })
    }

    /// Error numerics are 400-599.
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }

    /// Numerics that only update a WHOIS'd user.
    pub fn is_whois_related(&self) -> bool {
        use Response::*;
        matches!(
            self,
            RPL_AWAY
                | RPL_WHOISREGNICK
                | RPL_WHOISUSER
                | RPL_WHOISSERVER
                | RPL_WHOISOPERATOR
                | RPL_WHOISIDLE
                | RPL_ENDOFWHOIS
                | RPL_WHOISCHANNELS
                | RPL_WHOISACCOUNT
                | RPL_WHOISMODES
                | RPL_WHOISSECURE
        )
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}
