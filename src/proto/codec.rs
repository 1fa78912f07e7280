use bytes::{Buf, BytesMut};
use std::{
    fmt::{self, Write},
    io::{self},
    str,
};
use tokio_util::codec::{Decoder, Encoder};

use super::command::{Command, Reply};
use super::response::Response;

/// Line based SCPI framing. The codec remembers what kind of reply the last
/// command expects, because binary blocks and text lines can not be told
/// apart by looking at the stream alone.
#[derive(Default)]
pub struct ProtocolCodec {
    pending: Option<Reply>,
    after_block: bool,
}

impl ProtocolCodec {
    /// Drop the line terminator that follows a block. Returns `false` while
    /// the terminator may still be incomplete.
    fn skip_block_terminator(src: &mut BytesMut) -> bool {
        let n = src.iter().take_while(|b| **b == b'\r').count();
        match src.get(n).copied() {
            Some(b'\n') => src.advance(n + 1),
            Some(_) => src.advance(n),
            None => return false,
        }
        true
    }

    /// Throw away the rest of a reply that could not be decoded, so the next
    /// command does not read it.
    fn discard_line(src: &mut BytesMut) {
        match src.iter().position(|b| *b == b'\n') {
            Some(n) => src.advance(n + 1),
            None => src.clear(),
        }
    }

    fn decode_line(src: &mut BytesMut) -> io::Result<Option<Response>> {
        let Some(n) = src.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let line = str::from_utf8(&src[..n])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
            .trim_end_matches('\r')
            .to_string();
        src.advance(n + 1);
        Ok(Some(Response::Line(line)))
    }

    /// `#<digits><length><data>`
    fn decode_block(src: &mut BytesMut) -> io::Result<Option<Response>> {
        if src.len() < 2 {
            return Ok(None);
        }
        if src[0] != b'#' {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Block data expected but no # marker found",
            ));
        }
        let digits = match (src[1] as char).to_digit(10) {
            Some(0) | None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unsupported block length header: {:?}", src[1] as char),
                ))
            }
            Some(d) => d as usize,
        };
        let header_len = 2 + digits;
        if src.len() < header_len {
            return Ok(None);
        }
        let len = str::from_utf8(&src[2..header_len])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid block length"))?;
        if src.len() < header_len + len {
            return Ok(None);
        }
        src.advance(header_len);
        Ok(Some(Response::Block(src.split_to(len).freeze())))
    }
}

impl Decoder for ProtocolCodec {
    type Item = Response;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A block may be followed by a line terminator which belongs to no reply.
        if self.after_block {
            if !Self::skip_block_terminator(src) {
                return Ok(None);
            }
            self.after_block = false;
        }
        if src.is_empty() {
            return Ok(None);
        }

        let decoded = match self.pending {
            Some(Reply::Line) => Self::decode_line(src),
            Some(Reply::Block) => Self::decode_block(src),
            Some(Reply::None) | None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsolicited data from device: {:?}", &src[..]),
            )),
        };
        match decoded {
            Ok(Some(response)) => {
                self.pending = None;
                self.after_block = matches!(response, Response::Block(_));
                Ok(Some(response))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.pending = None;
                Self::discard_line(src);
                Err(err)
            }
        }
    }
}

fn write_fmt_guarded(dst: &mut BytesMut, args: fmt::Arguments<'_>) -> Result<(), io::Error> {
    dst.write_fmt(args)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

impl Encoder<Command> for ProtocolCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_fmt_guarded(dst, format_args!("{}\n", item))?;
        self.pending = match item.reply() {
            Reply::None => None,
            reply => Some(reply),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ScopeChannel;

    fn expect(codec: &mut ProtocolCodec, cmd: Command) {
        let mut out = BytesMut::new();
        codec.encode(cmd, &mut out).expect("encode");
    }

    #[test]
    fn encode_appends_newline() {
        let mut codec = ProtocolCodec::default();
        let mut out = BytesMut::new();
        codec.encode(Command::GetMeterRange, &mut out).expect("encode");
        assert_eq!(&out[..], b":DMM:RANGE?\n");
    }

    #[test]
    fn decode_line_waits_for_terminator() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetMeterConf);

        let mut src = BytesMut::from(&b"DIO"[..]);
        assert_eq!(codec.decode(&mut src).expect("decode"), None);
        src.extend_from_slice(b"DE\r\n");
        assert_eq!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Line("DIODE".to_string()))
        );
        assert!(src.is_empty());
    }

    #[test]
    fn decode_block_in_pieces() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetScreenWaveform(ScopeChannel::Ch1));

        let mut src = BytesMut::from(&b"#14ab"[..]);
        assert_eq!(codec.decode(&mut src).expect("decode"), None);
        src.extend_from_slice(b"\n\xff\n");
        match codec.decode(&mut src).expect("decode") {
            Some(Response::Block(data)) => assert_eq!(&data[..], b"ab\n\xff"),
            other => panic!("unexpected: {:?}", other),
        }
        // Trailing terminator is left for the next decode to discard.
        expect(&mut codec, Command::GetMeterValue);
        src.extend_from_slice(b"1.25\n");
        assert_eq!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Line("1.25".to_string()))
        );
    }

    #[test]
    fn reject_unsolicited_data() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::CycleMeterRange);
        let mut src = BytesMut::from(&b"junk\n"[..]);
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn reject_block_without_marker() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetScreenHeader);
        let mut src = BytesMut::from(&b"{\"a\":1}\n1.5\n"[..]);
        assert!(codec.decode(&mut src).is_err());
        // The broken reply is gone, the next one decodes cleanly.
        assert_eq!(&src[..], b"1.5\n");
        expect(&mut codec, Command::GetMeterValue);
        assert_eq!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Line("1.5".to_string()))
        );
    }

    #[test]
    fn invalid_text_drops_only_its_line() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetMeterValue);
        let mut src = BytesMut::from(&b"\xff\xfe\nDCV\n"[..]);
        assert!(codec.decode(&mut src).is_err());
        assert_eq!(&src[..], b"DCV\n");
    }

    #[test]
    fn empty_line_is_a_reply() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetMeterRange);
        let mut src = BytesMut::from(&b"\n"[..]);
        assert_eq!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Line(String::new()))
        );
    }

    #[test]
    fn block_terminator_split_across_reads() {
        let mut codec = ProtocolCodec::default();
        expect(&mut codec, Command::GetScreenHeader);
        let mut src = BytesMut::from(&b"#12{}\r"[..]);
        assert!(matches!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Block(_))
        ));
        expect(&mut codec, Command::GetMeterConf);
        assert_eq!(codec.decode(&mut src).expect("decode"), None);
        src.extend_from_slice(b"\nR\n");
        assert_eq!(
            codec.decode(&mut src).expect("decode"),
            Some(Response::Line("R".to_string()))
        );
    }
}
