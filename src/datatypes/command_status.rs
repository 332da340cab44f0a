use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

/// SMPP v3.4 `command_status` values (section 5.1.3).
///
/// Only meaningful on responses; requests always carry `Ok`. Each variant
/// renders with its `ESME_R*` mnemonic so SMSC rejections read the same in
/// logs as they do in operator documentation. Codes outside the table,
/// notably the SMSC vendor range 0x400..=0x4FF, decode to `Other` with the
/// raw value intact.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Ok = 0x0000_0000,

    // Header and session
    InvalidMsgLength = 0x0000_0001,
    InvalidCommandLength = 0x0000_0002,
    InvalidCommandId = 0x0000_0003,
    IncorrectBindStatus = 0x0000_0004,
    AlreadyBoundState = 0x0000_0005,
    InvalidPriorityFlag = 0x0000_0006,
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    SystemError = 0x0000_0008,

    // Addressing and bind credentials
    InvalidSourceAddress = 0x0000_000A,
    InvalidDestinationAddress = 0x0000_000B,
    InvalidMessageId = 0x0000_000C,
    BindFailed = 0x0000_000D,
    InvalidPassword = 0x0000_000E,
    InvalidSystemId = 0x0000_000F,

    // Message operations
    CancelSmFailed = 0x0000_0011,
    ReplacedSmFailed = 0x0000_0013,
    MessageQueueFull = 0x0000_0014,
    InvalidServiceType = 0x0000_0015,
    InvalidNumberOfDestinations = 0x0000_0033,
    InvalidDistributionListName = 0x0000_0034,
    InvalidDestinationFlag = 0x0000_0040,
    InvalidSubmitWithReplaceRequest = 0x0000_0042,
    InvalidEsmClassFieldData = 0x0000_0043,
    CannotSubmitToDistributionList = 0x0000_0044,
    SubmitFailed = 0x0000_0045,
    InvalidSourceAddressTon = 0x0000_0048,
    InvalidSourceAddressNpi = 0x0000_0049,
    InvalidDestinationAddressTon = 0x0000_0050,
    InvalidDestinationAddressNpi = 0x0000_0051,
    InvalidSystemTypeField = 0x0000_0053,
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    InvalidNumberOfMessages = 0x0000_0055,
    ThrottlingError = 0x0000_0058,
    InvalidScheduledDeliveryTime = 0x0000_0061,
    InvalidExpiryTime = 0x0000_0062,
    InvalidPredefinedMessageId = 0x0000_0063,

    // Returned by an ESME in deliver_sm_resp
    ReceiverTemporaryAppError = 0x0000_0064,
    ReceiverPermanentAppError = 0x0000_0065,
    ReceiverRejectMessageError = 0x0000_0066,

    QuerySmRequestFailed = 0x0000_0067,

    // Optional parameters
    ErrorInOptionalPartofPduBody = 0x0000_00C0,
    OptionalParameterNotAllowed = 0x0000_00C1,
    InvalidParameterLength = 0x0000_00C2,
    ExpectedOptionalParameterMissing = 0x0000_00C3,
    InvalidOptionalParameterValue = 0x0000_00C4,

    DeliveryFailed = 0x0000_00FE,
    UnknownError = 0x0000_00FF,

    #[num_enum(catch_all)]
    Other(u32),
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        *self == CommandStatus::Ok
    }

    /// Codes SMPP v3.4 leaves to SMSC vendors.
    pub fn is_vendor_specific(&self) -> bool {
        matches!(self, CommandStatus::Other(0x0400..=0x04FF))
    }

    /// Statuses an SMSC uses to refuse a bind because of the credentials or
    /// bind parameters, as opposed to a transient fault.
    pub fn is_bind_rejection(&self) -> bool {
        matches!(
            self,
            CommandStatus::BindFailed
                | CommandStatus::InvalidPassword
                | CommandStatus::InvalidSystemId
                | CommandStatus::InvalidSystemTypeField
                | CommandStatus::AlreadyBoundState
        )
    }

    /// The `ESME_R*` mnemonic for this status.
    pub fn mnemonic(&self) -> &'static str {
        use CommandStatus::*;
        match self {
            Ok => "ESME_ROK",
            InvalidMsgLength => "ESME_RINVMSGLEN",
            InvalidCommandLength => "ESME_RINVCMDLEN",
            InvalidCommandId => "ESME_RINVCMDID",
            IncorrectBindStatus => "ESME_RINVBNDSTS",
            AlreadyBoundState => "ESME_RALYBND",
            InvalidPriorityFlag => "ESME_RINVPRTFLG",
            InvalidRegisteredDeliveryFlag => "ESME_RINVREGDLVFLG",
            SystemError => "ESME_RSYSERR",
            InvalidSourceAddress => "ESME_RINVSRCADR",
            InvalidDestinationAddress => "ESME_RINVDSTADR",
            InvalidMessageId => "ESME_RINVMSGID",
            BindFailed => "ESME_RBINDFAIL",
            InvalidPassword => "ESME_RINVPASWD",
            InvalidSystemId => "ESME_RINVSYSID",
            CancelSmFailed => "ESME_RCANCELFAIL",
            ReplacedSmFailed => "ESME_RREPLACEFAIL",
            MessageQueueFull => "ESME_RMSGQFUL",
            InvalidServiceType => "ESME_RINVSERTYP",
            InvalidNumberOfDestinations => "ESME_RINVNUMDESTS",
            InvalidDistributionListName => "ESME_RINVDLNAME",
            InvalidDestinationFlag => "ESME_RINVDESTFLAG",
            InvalidSubmitWithReplaceRequest => "ESME_RINVSUBREP",
            InvalidEsmClassFieldData => "ESME_RINVESMCLASS",
            CannotSubmitToDistributionList => "ESME_RCNTSUBDL",
            SubmitFailed => "ESME_RSUBMITFAIL",
            InvalidSourceAddressTon => "ESME_RINVSRCTON",
            InvalidSourceAddressNpi => "ESME_RINVSRCNPI",
            InvalidDestinationAddressTon => "ESME_RINVDSTTON",
            InvalidDestinationAddressNpi => "ESME_RINVDSTNPI",
            InvalidSystemTypeField => "ESME_RINVSYSTYP",
            InvalidReplaceIfPresentFlag => "ESME_RINVREPFLAG",
            InvalidNumberOfMessages => "ESME_RINVNUMMSGS",
            ThrottlingError => "ESME_RTHROTTLED",
            InvalidScheduledDeliveryTime => "ESME_RINVSCHED",
            InvalidExpiryTime => "ESME_RINVEXPIRY",
            InvalidPredefinedMessageId => "ESME_RINVDFTMSGID",
            ReceiverTemporaryAppError => "ESME_RX_T_APPN",
            ReceiverPermanentAppError => "ESME_RX_P_APPN",
            ReceiverRejectMessageError => "ESME_RX_R_APPN",
            QuerySmRequestFailed => "ESME_RQUERYFAIL",
            ErrorInOptionalPartofPduBody => "ESME_RINVOPTPARSTREAM",
            OptionalParameterNotAllowed => "ESME_ROPTPARNOTALLWD",
            InvalidParameterLength => "ESME_RINVPARLEN",
            ExpectedOptionalParameterMissing => "ESME_RMISSINGOPTPARAM",
            InvalidOptionalParameterValue => "ESME_RINVOPTPARAMVAL",
            DeliveryFailed => "ESME_RDELIVERYFAILURE",
            UnknownError => "ESME_RUNKNOWNERR",
            Other(0x0400..=0x04FF) => "vendor specific",
            Other(_) => "reserved",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#010x})", self.mnemonic(), u32::from(*self))
    }
}
