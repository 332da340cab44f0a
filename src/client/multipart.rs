// ABOUTME: Reassembly of concatenated short messages from UDH or SAR fragment metadata
// ABOUTME: Buffers parts by reference and emits the joined payload once every part has arrived

use crate::datatypes::{EsmClass, Tlv, find_tlv, tags};
use bytes::{Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Concatenated SMS, 8-bit reference
const IEI_CONCAT_8BIT: u8 = 0x00;
/// Concatenated SMS, 16-bit reference
const IEI_CONCAT_16BIT: u8 = 0x08;

/// Concatenation reference. 8-bit and 16-bit references are separate
/// numbering spaces, so `Short(0xFF)` and `Long(0x00FF)` never meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    /// UDH IEI 0x00
    Short(u8),
    /// UDH IEI 0x08, or `sar_msg_ref_num`
    Long(u16),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Short(r) => write!(f, "{r:#04x}"),
            Reference::Long(r) => write!(f, "{r:#06x}"),
        }
    }
}

/// Position of one part within a multipart message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub reference: Reference,
    /// 1-based index of this part
    pub part: u8,
    pub total: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("part {part} of {total} is out of range for reference {reference}")]
    InvalidPart { reference: Reference, part: u8, total: u8 },
}

/// Find fragment metadata for an inbound message.
///
/// A User Data Header is used when esm_class sets UDHI or the payload opens
/// with a concatenation header; the header is stripped from the returned
/// payload. Otherwise the SAR optional parameters are consulted. Messages
/// carrying neither come back unchanged with `None`.
pub fn extract_fragment(esm_class: EsmClass, payload: &Bytes, tlvs: &[Tlv]) -> (Bytes, Option<Fragment>) {
    if esm_class.has_udhi() || looks_like_concat_udh(payload) {
        if let Some((body, fragment)) = parse_udh(payload) {
            return (body, fragment);
        }
        debug!(len = payload.len(), "malformed user data header, payload left intact");
    }

    (payload.clone(), sar_fragment(tlvs))
}

fn looks_like_concat_udh(payload: &[u8]) -> bool {
    payload.starts_with(&[0x05, IEI_CONCAT_8BIT, 0x03]) || payload.starts_with(&[0x06, IEI_CONCAT_16BIT, 0x04])
}

/// Split off the UDH. Returns the remaining text and any concatenation
/// element found, or `None` when the header runs past the payload.
fn parse_udh(payload: &Bytes) -> Option<(Bytes, Option<Fragment>)> {
    let udhl = *payload.first()? as usize;
    if payload.len() < 1 + udhl {
        return None;
    }

    let mut header = &payload[1..1 + udhl];
    let mut fragment = None;
    while let [iei, len, rest @ ..] = header {
        let len = *len as usize;
        if rest.len() < len {
            return None;
        }
        let (data, tail) = rest.split_at(len);
        match (*iei, data) {
            (IEI_CONCAT_8BIT, &[reference, total, part]) => {
                fragment = Some(Fragment {
                    reference: Reference::Short(reference),
                    part,
                    total,
                });
            }
            (IEI_CONCAT_16BIT, &[hi, lo, total, part]) => {
                fragment = Some(Fragment {
                    reference: Reference::Long(u16::from_be_bytes([hi, lo])),
                    part,
                    total,
                });
            }
            _ => {}
        }
        header = tail;
    }

    Some((payload.slice(1 + udhl..), fragment))
}

fn sar_fragment(tlvs: &[Tlv]) -> Option<Fragment> {
    let reference = find_tlv(tlvs, tags::SAR_MSG_REF_NUM)
        .and_then(|t| t.as_u16().or_else(|| t.as_u8().map(u16::from)))?;
    let total = find_tlv(tlvs, tags::SAR_TOTAL_SEGMENTS).and_then(Tlv::as_u8)?;
    let part = find_tlv(tlvs, tags::SAR_SEGMENT_SEQNUM).and_then(Tlv::as_u8)?;
    Some(Fragment {
        reference: Reference::Long(reference),
        part,
        total,
    })
}

#[derive(Debug)]
struct PendingFragments {
    total: u8,
    parts: BTreeMap<u8, Bytes>,
}

/// Buffers fragments per reference until the message is complete.
///
/// Nothing here is persisted or expires; incomplete messages live until
/// `clear` or process exit.
#[derive(Debug, Default)]
pub struct MultipartReassembler {
    pending: HashMap<Reference, PendingFragments>,
}

impl MultipartReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one part. Returns the joined payload, parts in index order,
    /// once all `total` parts for `reference` are present.
    pub fn accept(
        &mut self,
        reference: Reference,
        part: u8,
        total: u8,
        payload: Bytes,
    ) -> Result<Option<Bytes>, FragmentError> {
        if part == 0 || part > total {
            return Err(FragmentError::InvalidPart {
                reference,
                part,
                total,
            });
        }
        if total == 1 {
            return Ok(Some(payload));
        }

        let entry = self
            .pending
            .entry(reference)
            .or_insert_with(|| PendingFragments {
                total,
                parts: BTreeMap::new(),
            });

        if entry.total != total {
            warn!(
                %reference,
                expected = entry.total,
                got = total,
                "fragment total changed, discarding buffered parts"
            );
            entry.total = total;
            entry.parts.clear();
        }

        if entry.parts.insert(part, payload).is_some() {
            debug!(%reference, part, "duplicate fragment replaced");
        }

        if entry.parts.len() < total as usize {
            debug!(%reference, have = entry.parts.len(), total, "fragment buffered");
            return Ok(None);
        }

        let Some(complete) = self.pending.remove(&reference) else {
            return Ok(None);
        };
        let size = complete.parts.values().map(Bytes::len).sum();
        let mut joined = BytesMut::with_capacity(size);
        for part in complete.parts.into_values() {
            joined.extend_from_slice(&part);
        }
        Ok(Some(joined.freeze()))
    }

    /// References with parts still outstanding
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
