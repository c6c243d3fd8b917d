
pub mod codec;

use log::debug;
use shared::error::{Error, Result};

use crate::description::{RTCPayload, StreamType};
use codec::{AudioPayload, Codec, TransportPayload, VideoPayload};

const DEFAULT_AUDIO_CHANNELS: u16 = 1;

/// Reports whether two non-RTX payloads describe the same codec: same encoding
/// name, and same packetization mode when both define one.
fn is_same_codec(a: &RTCPayload, b: &RTCPayload) -> bool {
    if a.is_rtx() || b.is_rtx() || !a.encoding_name.eq_ignore_ascii_case(&b.encoding_name) {
        return false;
    }
    match (a.packetization_mode(), b.packetization_mode()) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

fn find_base(payloads: &[RTCPayload], rtx: &RTCPayload) -> Option<usize> {
    let apt = rtx.apt()?;
    payloads
        .iter()
        .position(|p| !p.is_rtx() && p.payload_type == apt)
}

/// Keeps the entries of `candidates` that `reference` supports, in the order
/// of `candidates`.
///
/// A kept codec entry has its feedback flags ANDed with its counterpart in
/// `reference`. An RTX entry is kept only when `reference` has an RTX for the
/// counterpart of its base.
pub fn intersect(candidates: &[RTCPayload], reference: &[RTCPayload]) -> Vec<RTCPayload> {
    let mut result = vec![];

    for candidate in candidates {
        if candidate.is_rtx() {
            let Some(base) = find_base(candidates, candidate) else {
                debug!(
                    "dropping rtx payload {} without base",
                    candidate.payload_type
                );
                continue;
            };
            let Some(counterpart) = reference
                .iter()
                .find(|r| is_same_codec(&candidates[base], r))
            else {
                continue;
            };
            if reference
                .iter()
                .any(|r| r.is_rtx() && r.apt() == Some(counterpart.payload_type))
            {
                result.push(candidate.clone());
            }
        } else if let Some(matched) = reference.iter().find(|r| is_same_codec(candidate, r)) {
            let mut payload = candidate.clone();
            payload.nack &= matched.nack;
            payload.nack_pli &= matched.nack_pli;
            payload.ccm_fir &= matched.ccm_fir;
            result.push(payload);
        }
    }

    result
}

/// Returns the first codec entry of `payloads` followed by its RTX entry, if
/// a later one exists. Everything else is ignored.
pub fn select_preferred(payloads: &[RTCPayload]) -> Vec<RTCPayload> {
    let Some(base_index) = payloads.iter().position(|p| !p.is_rtx()) else {
        return vec![];
    };
    let base = &payloads[base_index];

    let mut result = vec![base.clone()];
    if let Some(rtx) = payloads[base_index + 1..]
        .iter()
        .find(|p| p.is_rtx() && p.apt() == Some(base.payload_type))
    {
        result.push(rtx.clone());
    }
    result
}

/// Maps payloads to the concrete configuration a media transport consumes.
///
/// Codec entries with an unknown encoding name are skipped. RTX entries are
/// folded into their base video payload.
pub fn transform(
    payloads: Option<&[RTCPayload]>,
    stream_type: StreamType,
) -> Result<Vec<TransportPayload>> {
    let payloads = payloads
        .ok_or_else(|| Error::ErrInvalidArgument("payload list is absent".to_owned()))?;
    if !stream_type.is_media() {
        return Err(Error::ErrInvalidArgument(format!(
            "{stream_type} streams carry no payloads"
        )));
    }

    let mut result = vec![];
    for payload in payloads.iter().filter(|p| !p.is_rtx()) {
        let Some(codec) = Codec::from_name(&payload.encoding_name, stream_type) else {
            debug!(
                "skipping payload {}: {}",
                payload.payload_type,
                Error::ErrUnsupportedCodec(payload.encoding_name.clone())
            );
            continue;
        };

        let transformed = match stream_type {
            StreamType::Audio => TransportPayload::Audio(AudioPayload {
                payload_type: payload.payload_type,
                codec,
                clock_rate: payload.clock_rate,
                channels: payload.channels.unwrap_or(DEFAULT_AUDIO_CHANNELS),
            }),
            _ => {
                let rtx = payloads
                    .iter()
                    .find(|p| p.is_rtx() && p.apt() == Some(payload.payload_type));
                TransportPayload::Video(VideoPayload {
                    payload_type: payload.payload_type,
                    codec,
                    clock_rate: payload.clock_rate,
                    ccm_fir: payload.ccm_fir,
                    nack_pli: payload.nack_pli,
                    rtx_payload_type: rtx.map(|r| r.payload_type),
                    rtx_time: rtx.and_then(RTCPayload::rtx_time),
                })
            }
        };
        result.push(transformed);
    }

    Ok(result)
}

/// Reorders `payloads` by the position of each codec entry's counterpart in
/// `reference`, placing every RTX entry right after its base.
///
/// Entries without a counterpart keep their relative order at the end.
pub fn reorder_by_preference(payloads: &[RTCPayload], reference: &[RTCPayload]) -> Vec<RTCPayload> {
    let mut bases: Vec<(usize, &RTCPayload)> = payloads
        .iter()
        .filter(|p| !p.is_rtx())
        .map(|p| {
            let rank = reference
                .iter()
                .position(|r| is_same_codec(p, r))
                .unwrap_or(usize::MAX);
            (rank, p)
        })
        .collect();
    // stable, so ties keep the incoming order
    bases.sort_by_key(|(rank, _)| *rank);

    let mut result = Vec::with_capacity(payloads.len());
    for (_, base) in bases {
        result.push(base.clone());
        result.extend(
            payloads
                .iter()
                .filter(|p| p.is_rtx() && p.apt() == Some(base.payload_type))
                .cloned(),
        );
    }
    result.extend(
        payloads
            .iter()
            .filter(|p| p.is_rtx() && find_base(payloads, p).is_none())
            .cloned(),
    );

    result
}
