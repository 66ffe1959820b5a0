use crate::prelude::{CollectorError, CollectorResult};

/// 2.4 GHz ISM band: channel number to center frequency in MHz.
const CHANNELS_2_4GHZ: [(u32, u32); 14] = [
    (1, 2412),
    (2, 2417),
    (3, 2422),
    (4, 2427),
    (5, 2432),
    (6, 2437),
    (7, 2442),
    (8, 2447),
    (9, 2452),
    (10, 2457),
    (11, 2462),
    (12, 2467),
    (13, 2472),
    (14, 2484),
];

/// 5 GHz U-NII channel plan. Center frequency is `5000 + 5 * channel`.
const CHANNELS_5GHZ: &[u32] = &[
    32, 34, 36, 38, 40, 42, 44, 46, 48, 50, 52, 54, 56, 58, 60, 62, 64, 68, 96, 100, 102, 104,
    106, 108, 110, 112, 114, 116, 118, 120, 122, 124, 126, 128, 130, 132, 134, 136, 138, 140, 142,
    144, 149, 151, 153, 155, 157, 159, 161, 163, 165, 167, 169, 171, 173, 175, 177,
];

fn frequency_5ghz(channel: u32) -> u32 {
    5000 + 5 * channel
}

/// Derive the channel number for a center frequency.
pub fn channel_for_frequency(freq_mhz: u32) -> CollectorResult<u32> {
    if let Some((channel, _)) = CHANNELS_2_4GHZ.iter().find(|(_, freq)| *freq == freq_mhz) {
        return Ok(*channel);
    }
    CHANNELS_5GHZ
        .iter()
        .copied()
        .find(|&channel| frequency_5ghz(channel) == freq_mhz)
        .ok_or(CollectorError::UnknownFrequency(freq_mhz))
}

/// Center frequency of a channel, preferring the 2.4 GHz plan for 1-14.
pub fn frequency_for_channel(channel: u32) -> Option<u32> {
    CHANNELS_2_4GHZ
        .iter()
        .find(|(ch, _)| *ch == channel)
        .map(|(_, freq)| *freq)
        .or_else(|| {
            CHANNELS_5GHZ
                .contains(&channel)
                .then(|| frequency_5ghz(channel))
        })
}
