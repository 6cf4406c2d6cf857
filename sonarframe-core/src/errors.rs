use crate::enums::RecordTypeId;

/// Error type shared by the 7K stream parser, the DRF container, the subscription protocol and
/// the GSF record store.
///
/// This mirrors spec error kinds 2-4 (resyncable framing errors never surface as a
/// [`SonarframeError`]; they are absorbed into parser statistics instead).
#[derive(Debug)]
pub enum SonarframeError {
    /// `std::io` error from the underlying transport or file.
    StdIoError(std::io::Error),
    /// A fixed-size slice conversion failed while decoding a header.
    TryFromSlice(std::array::TryFromSliceError),
    /// A read/write call exceeded its timeout without completing.
    Timeout,
    /// The transport reached end of stream.
    Eof,
    /// The peer closed the socket.
    SocketClosed,
    /// The parser's fixed internal buffer is full and cannot accept more bytes.
    BufferFull,
    /// A DRF's trailing checksum did not match the computed byte-sum.
    ChecksumMismatch { expected: u32, computed: u32 },
    /// A header field did not match an expected protocol constant.
    ProtocolVersion { expected: u16, found: u16 },
    /// The DRF sync pattern did not match.
    SyncPattern { found: u32 },
    /// A declared frame or record size was implausible (too small or too large).
    SizeOutOfRange { size: u32 },
    /// A frame's timestamp was not newer than the caller-supplied floor.
    StaleTimestamp,
    /// `record_type_id` is not in the closed catalog this parser recognizes.
    UnrecognizedRecordId { id: u32 },
    /// The DRF container has no more capacity and cannot grow further.
    NoSpace,
    /// Allocation failure building a growable buffer or offset table.
    OutOfMemory,
    /// The first record of a GSF file did not decode to a recognizable `"GSF-vM.m"` header.
    UnrecognizedFile,
    /// A GSF record's declared size was `<= 8` or `> MAX_RECORD_SIZE`.
    RecordSizeError { size: u32 },
    /// Attempted an operation the current access mode does not permit.
    BadAccessMode,
    /// The GSF file-table has no free slots.
    TooManyOpenFiles,
    /// The file could not be opened.
    FOpenError(std::io::Error),
    /// A seek on the underlying file failed.
    FileSeekError(std::io::Error),
    /// A flush between a read and a write (or vice versa) failed.
    FlushError(std::io::Error),
    /// Growing an existing processing-parameter string in `UPDATE`/`UPDATE_INDEX` mode.
    ParamSizeFixed,
    /// A scale-factor multiplier fell outside `[MIN_SF_MULT, MAX_SF_MULT]`.
    IllegalScaleFactorMultiplier { requested: f64 },
    /// The requested precision cannot be represented as an integer multiplier.
    CannotRepresentPrecision { precision: f64 },
    /// More distinct beam-array subrecord ids were loaded than the table supports.
    TooManyArraySubrecords,
    /// `load_scale_factor_auto_offset` was called for a subrecord id other than depth/nominal
    /// depth.
    UnrecognizedArraySubrecordId { id: u32 },
    /// A record was truncated; the file position has been rewound to the start of the record so
    /// the read can be retried once more data is appended.
    ReadToEndOfFile,
    /// A `record_type_id` was read but this parser has no decoder registered for it.
    UnrecognizedGsfRecordId { id: u32 },
    /// A GSF index file's header was absent, malformed, or stale relative to the indexed file.
    IndexStale,
    /// Encoding a record body produced a larger byte count than its type permits.
    EncodeOverflow { kind: RecordTypeId },
    /// A ping opened by record number has no governing scale-factor record at or before it in
    /// the index.
    NoGoverningScaleFactors { ping_number: usize },
    #[cfg(feature = "to_json")]
    /// Serialisation/Deserialisation error.
    SerdeError(serde_json::Error),
}

impl From<std::array::TryFromSliceError> for SonarframeError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::io::Error> for SonarframeError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl std::fmt::Display for SonarframeError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::SonarframeError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            TryFromSlice(x) => write!(fmt, "{}", x),
            Timeout => write!(fmt, "read/write timed out"),
            Eof => write!(fmt, "end of stream"),
            SocketClosed => write!(fmt, "socket closed by peer"),
            BufferFull => write!(fmt, "parser buffer is full"),
            ChecksumMismatch { expected, computed } => {
                write!(fmt, "checksum mismatch: expected {}, computed {}", expected, computed)
            }
            ProtocolVersion { expected, found } => {
                write!(fmt, "protocol version mismatch: expected {}, found {}", expected, found)
            }
            SyncPattern { found } => write!(fmt, "sync pattern mismatch: found {:#x}", found),
            SizeOutOfRange { size } => write!(fmt, "frame/record size {} is out of range", size),
            StaleTimestamp => write!(fmt, "frame timestamp is not newer than the requested floor"),
            UnrecognizedRecordId { id } => write!(fmt, "unrecognized 7K record_type_id {}", id),
            NoSpace => write!(fmt, "DRF container has no remaining capacity"),
            OutOfMemory => write!(fmt, "allocation failed"),
            UnrecognizedFile => write!(fmt, "file does not begin with a GSF header record"),
            RecordSizeError { size } => write!(fmt, "GSF record size {} is out of range", size),
            BadAccessMode => write!(fmt, "operation not permitted in this access mode"),
            TooManyOpenFiles => write!(fmt, "GSF file table has no free slots"),
            FOpenError(e) => write!(fmt, "could not open file: {}", e),
            FileSeekError(e) => write!(fmt, "seek failed: {}", e),
            FlushError(e) => write!(fmt, "flush failed: {}", e),
            ParamSizeFixed => write!(fmt, "cannot grow a processing parameter in this access mode"),
            IllegalScaleFactorMultiplier { requested } => write!(
                fmt,
                "scale factor multiplier {} is out of the representable range",
                requested
            ),
            CannotRepresentPrecision { precision } => write!(
                fmt,
                "precision {} cannot be represented as an integer multiplier",
                precision
            ),
            TooManyArraySubrecords => write!(fmt, "too many distinct beam-array subrecords"),
            UnrecognizedArraySubrecordId { id } => write!(
                fmt,
                "auto-offset is only supported for depth subrecords, got {}",
                id
            ),
            ReadToEndOfFile => write!(fmt, "short read at end of file"),
            UnrecognizedGsfRecordId { id } => write!(fmt, "unrecognized GSF record_type_id {}", id),
            IndexStale => write!(fmt, "GSF index is missing, malformed, or stale"),
            EncodeOverflow { kind } => write!(fmt, "encoded {:?} record exceeds its size limit", kind),
            NoGoverningScaleFactors { ping_number } => {
                write!(fmt, "ping number {} has no governing scale-factor record in the index", ping_number)
            }
        }
    }
}

impl From<SonarframeError> for String {
    fn from(e: SonarframeError) -> String {
        e.to_string()
    }
}

impl std::error::Error for SonarframeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::SonarframeError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => x.source(),
            StdIoError(x) | FOpenError(x) | FileSeekError(x) | FlushError(x) => x.source(),
            TryFromSlice(x) => x.source(),
            _ => None,
        }
    }
}
