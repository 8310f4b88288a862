//! G.711 µ-law and A-law companding.
//!
//! Decoders produce 16-bit linear samples. Encoders take the codec's native
//! depth: 14-bit for µ-law and 13-bit for A-law, so callers shift a 16-bit
//! value right by 2 or 3 before encoding.

const QUANT_MASK: u8 = 0x0f;
const SEG_MASK: u8 = 0x70;
const SEG_SHIFT: u32 = 4;
const SIGN_BIT: u8 = 0x80;

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 8159;

const SEG_ULAW_END: [i32; 8] = [0x3f, 0x7f, 0xff, 0x1ff, 0x3ff, 0x7ff, 0xfff, 0x1fff];
const SEG_ALAW_END: [i32; 8] = [0x1f, 0x3f, 0x7f, 0xff, 0x1ff, 0x3ff, 0x7ff, 0xfff];

fn segment(value: i32, table: &[i32; 8]) -> u32 {
    table
        .iter()
        .position(|&end| value <= end)
        .map_or(8, |seg| seg as u32)
}

/// Decode a µ-law byte to 16-bit linear PCM.
pub fn ulaw_to_linear16(code: u8) -> i16 {
    let u = !code;
    let mut t = (i32::from(u & QUANT_MASK) << 3) + ULAW_BIAS;
    t <<= u32::from(u & SEG_MASK) >> SEG_SHIFT;
    let v = if u & SIGN_BIT != 0 {
        ULAW_BIAS - t
    } else {
        t - ULAW_BIAS
    };
    v as i16
}

/// Encode a 14-bit linear sample as µ-law.
pub fn linear14_to_ulaw(pcm: i16) -> u8 {
    let mut pcm = i32::from(pcm);
    let mask: u8 = if pcm < 0 {
        pcm = -pcm;
        0x7f
    } else {
        0xff
    };
    pcm = pcm.min(ULAW_CLIP) + (ULAW_BIAS >> 2);

    let seg = segment(pcm, &SEG_ULAW_END);
    if seg >= 8 {
        return 0x7f ^ mask;
    }
    let uval = ((seg as u8) << SEG_SHIFT) | ((pcm >> (seg + 1)) as u8 & QUANT_MASK);
    uval ^ mask
}

/// Decode an A-law byte to 16-bit linear PCM.
pub fn alaw_to_linear16(code: u8) -> i16 {
    let a = code ^ 0x55;
    let mut t = i32::from(a & QUANT_MASK) << 4;
    let seg = u32::from(a & SEG_MASK) >> SEG_SHIFT;
    match seg {
        0 => t += 8,
        1 => t += 0x108,
        _ => {
            t += 0x108;
            t <<= seg - 1;
        }
    }
    let v = if a & SIGN_BIT != 0 { t } else { -t };
    v as i16
}

/// Encode a 13-bit linear sample as A-law.
pub fn linear13_to_alaw(pcm: i16) -> u8 {
    let mut pcm = i32::from(pcm);
    let mask: u8 = if pcm >= 0 {
        0xd5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let seg = segment(pcm, &SEG_ALAW_END);
    if seg >= 8 {
        return 0x7f ^ mask;
    }
    let shift = if seg < 2 { 1 } else { seg };
    let aval = ((seg as u8) << SEG_SHIFT) | ((pcm >> shift) as u8 & QUANT_MASK);
    aval ^ mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulaw_silence_is_zero() {
        assert_eq!(ulaw_to_linear16(0xff), 0);
        assert_eq!(linear14_to_ulaw(0), 0xff);
    }

    #[test]
    fn ulaw_extremes() {
        assert_eq!(ulaw_to_linear16(0x80), 32124);
        assert_eq!(ulaw_to_linear16(0x00), -32124);
        assert_eq!(linear14_to_ulaw(i16::MAX >> 2), 0x80);
        assert_eq!(linear14_to_ulaw(i16::MIN >> 2), 0x00);
    }

    #[test]
    fn ulaw_codes_survive_round_trip() {
        // 0x7f is negative zero and re-encodes as 0xff.
        for code in (0..=255u8).filter(|&c| c != 0x7f) {
            assert_eq!(linear14_to_ulaw(ulaw_to_linear16(code) >> 2), code, "code {code:#04x}");
        }
        assert_eq!(linear14_to_ulaw(ulaw_to_linear16(0x7f) >> 2), 0xff);
    }

    #[test]
    fn alaw_codes_survive_round_trip() {
        for code in 0..=255u8 {
            assert_eq!(linear13_to_alaw(alaw_to_linear16(code) >> 3), code, "code {code:#04x}");
        }
    }

    #[test]
    fn alaw_extremes() {
        assert_eq!(alaw_to_linear16(0xaa), 32256);
        assert_eq!(alaw_to_linear16(0x2a), -32256);
        assert_eq!(linear13_to_alaw(i16::MAX >> 3), 0xaa);
        assert_eq!(linear13_to_alaw(i16::MIN >> 3), 0x2a);
    }
}
