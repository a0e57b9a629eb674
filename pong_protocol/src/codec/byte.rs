// Compact fixed-schema binary codec.
//
// Layout (big-endian):
//   "#rf" | id:str8 | time:u64 | players:u16 n * (id:str8 x:i16 y:i16)
//         | balls:u16 n * (id:str8 x:i16 y:i16 snap:u8) | scores:u16 n * (id:str8 score:u16)
// str8 is a u8 byte length followed by UTF-8. Coordinates keep COORD_DIGITS
// decimal digits so both ends agree on the value after the round trip.

use super::SnapshotCodec;
use crate::control::PaddleUpdate;
use crate::error::CodecError;
use crate::frame::Frame;
use crate::snapshot::{BallEntry, PlayerEntry, ScoreEntry, Snapshot, SnapshotState};

pub const SNAPSHOT_TAG: &[u8; 3] = b"#rf";
pub const PADDLE_UPDATE_TAG: &[u8; 3] = b"#ru";

/// Declared decimal precision of coordinate fields.
pub const COORD_DIGITS: i32 = 4;

fn coord_scale() -> f64 {
    10f64.powi(COORD_DIGITS)
}

fn quantize(v: f64) -> i16 {
    // Float-to-int `as` saturates; NaN maps to 0.
    (v * coord_scale()).round() as i16
}

fn dequantize(n: i16) -> f64 {
    f64::from(n) / coord_scale()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCodec;

impl SnapshotCodec for ByteCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Frame, CodecError> {
        let mut w = Writer::with_tag(SNAPSHOT_TAG);
        w.str8("id", &snapshot.id)?;
        w.u64(snapshot.time);

        let state = &snapshot.state;
        w.count("players", state.players.len())?;
        for p in &state.players {
            w.str8("player id", &p.id)?;
            w.coord(p.x);
            w.coord(p.y);
        }

        w.count("balls", state.balls.len())?;
        for b in &state.balls {
            w.str8("ball id", &b.id)?;
            w.coord(b.x);
            w.coord(b.y);
            w.u8(u8::from(b.snap));
        }

        w.count("scores", state.scores.len())?;
        for s in &state.scores {
            w.str8("score id", &s.id)?;
            w.u16(u16::try_from(s.score).unwrap_or(u16::MAX));
        }

        Ok(Frame::Binary(w.finish()))
    }

    fn decode(&self, frame: &Frame) -> Result<Snapshot, CodecError> {
        let Frame::Binary(bytes) = frame else {
            return Err(CodecError::WrongFrameKind);
        };

        let mut r = Reader::expect_tag(bytes, SNAPSHOT_TAG)?;
        let id = r.str8()?;
        let time = r.u64()?;

        let players = (0..r.u16()?)
            .map(|_| -> Result<PlayerEntry, CodecError> {
                Ok(PlayerEntry {
                    id: r.str8()?,
                    x: r.coord()?,
                    y: r.coord()?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let balls = (0..r.u16()?)
            .map(|_| -> Result<BallEntry, CodecError> {
                Ok(BallEntry {
                    id: r.str8()?,
                    x: r.coord()?,
                    y: r.coord()?,
                    snap: r.u8()? != 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scores = (0..r.u16()?)
            .map(|_| -> Result<ScoreEntry, CodecError> {
                Ok(ScoreEntry {
                    id: r.str8()?,
                    score: u32::from(r.u16()?),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        r.finish()?;

        Ok(Snapshot {
            id,
            time,
            state: SnapshotState {
                players,
                balls,
                scores,
            },
        })
    }
}

/// Encodes a paddle update as `"#ru" | y:i16`.
pub fn encode_paddle_update(update: PaddleUpdate) -> Vec<u8> {
    let mut w = Writer::with_tag(PADDLE_UPDATE_TAG);
    w.coord(update.y);
    w.finish()
}

pub fn decode_paddle_update(bytes: &[u8]) -> Result<PaddleUpdate, CodecError> {
    let mut r = Reader::expect_tag(bytes, PADDLE_UPDATE_TAG)?;
    let y = r.coord()?;
    r.finish()?;
    Ok(PaddleUpdate { y })
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_tag(tag: &[u8; 3]) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag);
        Self { buf }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn coord(&mut self, v: f64) {
        self.buf.extend_from_slice(&quantize(v).to_be_bytes());
    }

    fn count(&mut self, field: &'static str, len: usize) -> Result<(), CodecError> {
        let n = u16::try_from(len).map_err(|_| CodecError::TooLong { field, len })?;
        self.u16(n);
        Ok(())
    }

    fn str8(&mut self, field: &'static str, s: &str) -> Result<(), CodecError> {
        let len = s.len();
        let n = u8::try_from(len).map_err(|_| CodecError::TooLong { field, len })?;
        self.u8(n);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn expect_tag(buf: &'a [u8], tag: &[u8; 3]) -> Result<Self, CodecError> {
        if buf.len() < tag.len() {
            return Err(CodecError::Truncated);
        }
        if &buf[..tag.len()] != tag {
            return Err(CodecError::BadTag);
        }
        Ok(Self {
            buf,
            pos: tag.len(),
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(n).ok_or(CodecError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(CodecError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn coord(&mut self) -> Result<f64, CodecError> {
        Ok(dequantize(i16::from_be_bytes(self.array()?)))
    }

    fn str8(&mut self) -> Result<String, CodecError> {
        let len = usize::from(self.u8()?);
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    fn finish(self) -> Result<(), CodecError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
