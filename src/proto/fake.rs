use std::collections::{HashMap, HashSet, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::mode::MeasurementMode;

/// In-memory stand-in for an HDS2102S. It parses the command lines written to
/// it, keeps a small model of the meter, scope and generator state and queues
/// the replies the real device would send.
#[derive(Clone, Default)]
pub(crate) struct SimulatedHds {
    inner: Arc<Mutex<SimState>>,
}

pub(crate) struct SimState {
    pub model: String,
    pub mode: MeasurementMode,
    pub milli_scale: bool,
    pub range_position: usize,
    pub range_cycles: HashMap<MeasurementMode, Vec<String>>,
    pub auto_range: bool,
    pub meter_value: String,
    pub display: [bool; 2],
    pub coupling: [String; 2],
    pub probe: [String; 2],
    pub depth: String,
    pub header: String,
    pub samples: Vec<i16>,
    scripted: HashMap<String, VecDeque<String>>,
    muted: HashSet<String>,
    commands: Vec<String>,
    inbound: Vec<u8>,
    outbound: VecDeque<u8>,
}

fn labels(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SimState {
    fn default() -> Self {
        let mut range_cycles = HashMap::new();
        range_cycles.insert(
            MeasurementMode::DcVoltage,
            labels(&["2V", "20V", "200V", "1000V"]),
        );
        range_cycles.insert(
            MeasurementMode::AcVoltage,
            labels(&["2V", "20V", "200V", "750V"]),
        );
        range_cycles.insert(
            MeasurementMode::Resistance,
            labels(&["200Ω", "2kΩ", "20kΩ", "200kΩ", "2MΩ", "20MΩ", "100MΩ"]),
        );

        Self {
            model: "HDS2102S".to_string(),
            mode: MeasurementMode::DcVoltage,
            milli_scale: false,
            range_position: 0,
            range_cycles,
            auto_range: true,
            meter_value: "1.2345".to_string(),
            display: [true, false],
            coupling: ["DC".to_string(), "AC".to_string()],
            probe: ["10X".to_string(), "1X".to_string()],
            depth: "4K".to_string(),
            header: r#"{"TIMEBASE":{"SCALE":"200us","HOFFSET":0},"SAMPLE":{"FULLSCREEN":600,"DATALEN":600,"SAMPLERATE":"(2.5MS/s)","DEPMEM":"4K"}}"#.to_string(),
            samples: vec![0x4000; 600],
            scripted: HashMap::new(),
            muted: HashSet::new(),
            commands: Vec::new(),
            inbound: Vec::new(),
            outbound: VecDeque::new(),
        }
    }
}

impl SimState {
    fn reply_line(&mut self, line: impl AsRef<str>) {
        self.outbound.extend(line.as_ref().as_bytes());
        self.outbound.push_back(b'\n');
    }

    fn reply_block(&mut self, data: &[u8]) {
        let len = data.len().to_string();
        self.outbound
            .extend(format!("#{}{}", len.len(), len).as_bytes());
        self.outbound.extend(data);
        self.outbound.push_back(b'\n');
    }

    fn channel(head: &str) -> Option<usize> {
        match head.get(..4) {
            Some(":CH1") => Some(0),
            Some(":CH2") => Some(1),
            _ => None,
        }
    }

    fn current_range(&self) -> String {
        match self.mode {
            MeasurementMode::DcVoltage | MeasurementMode::AcVoltage if self.milli_scale => {
                "200mV".to_string()
            }
            MeasurementMode::DcCurrent | MeasurementMode::AcCurrent if self.milli_scale => {
                "200mA".to_string()
            }
            MeasurementMode::DcCurrent | MeasurementMode::AcCurrent => "10A".to_string(),
            mode => match self.range_cycles.get(&mode) {
                Some(cycle) if !cycle.is_empty() => cycle[self.range_position % cycle.len()].clone(),
                _ => "---".to_string(),
            },
        }
    }

    fn handle(&mut self, line: &str) {
        self.commands.push(line.to_string());

        if self.muted.contains(line) {
            return;
        }
        if let Some(reply) = self.scripted.get_mut(line).and_then(|q| q.pop_front()) {
            self.reply_line(reply);
            return;
        }

        let (head, arg) = match line.split_once(' ') {
            Some((head, arg)) => (head, arg),
            None => (line, ""),
        };

        match (head, arg) {
            ("*IDN?", _) => {
                let idn = format!("OWON,{},2136012,V3.0.1", self.model);
                self.reply_line(idn);
            }
            (":DMM:CONF:VOLT", "AC") => self.set_mode(MeasurementMode::AcVoltage),
            (":DMM:CONF:VOLT", "DC") => self.set_mode(MeasurementMode::DcVoltage),
            (":DMM:CONF:CURR", "AC") => self.set_mode(MeasurementMode::AcCurrent),
            (":DMM:CONF:CURR", "DC") => self.set_mode(MeasurementMode::DcCurrent),
            (":DMM:CONF", "RES") => self.set_mode(MeasurementMode::Resistance),
            (":DMM:CONF", "CAP") => self.set_mode(MeasurementMode::Capacitance),
            (":DMM:CONF", "CONT") => self.set_mode(MeasurementMode::Continuity),
            (":DMM:CONF", "DIOD") => self.set_mode(MeasurementMode::Diode),
            (":DMM:CONF?", _) => {
                let token = match self.mode {
                    MeasurementMode::Continuity => "RS",
                    MeasurementMode::Resistance => "R",
                    MeasurementMode::Capacitance => "C",
                    MeasurementMode::Diode => "DIODE",
                    MeasurementMode::DcVoltage | MeasurementMode::AcVoltage => "VOLT",
                    MeasurementMode::DcCurrent | MeasurementMode::AcCurrent => "CURR",
                };
                self.reply_line(token);
            }
            (":DMM:CONF:VOLT?", _) => {
                let token = match self.mode {
                    MeasurementMode::DcVoltage => "DCV",
                    MeasurementMode::AcVoltage => "ACV",
                    _ => "OFF",
                };
                self.reply_line(token);
            }
            (":DMM:CONF:CURR?", _) => {
                let token = match self.mode {
                    MeasurementMode::DcCurrent => "DCA",
                    MeasurementMode::AcCurrent => "ACA",
                    _ => "OFF",
                };
                self.reply_line(token);
            }
            (":DMM:RANGE?", _) => {
                let range = self.current_range();
                self.reply_line(range);
            }
            (":DMM:RANGE", "ON") => {
                self.range_position += 1;
                self.auto_range = false;
            }
            (":DMM:RANGE", "mV") | (":DMM:RANGE", "mA") => self.milli_scale = true,
            (":DMM:RANGE", "V") | (":DMM:RANGE", "A") => self.milli_scale = false,
            (":DMM:AUTO", "ON") => self.auto_range = true,
            (":DMM:MEAS?", _) => {
                let value = self.meter_value.clone();
                self.reply_line(value);
            }
            (":ACQ:DEPM?", _) => {
                let depth = self.depth.clone();
                self.reply_line(depth);
            }
            (":ACQ:DEPM", depth) => self.depth = depth.to_string(),
            (":DAT:WAV:SCR:HEAD?", _) => {
                let header = self.header.clone().into_bytes();
                self.reply_block(&header);
            }
            (":DAT:WAV:SCR:CH1?", _) | (":DAT:WAV:SCR:CH2?", _) => {
                let data: Vec<u8> = self.samples.iter().flat_map(|s| s.to_le_bytes()).collect();
                self.reply_block(&data);
            }
            (head, arg) if Self::channel(head).is_some() => {
                let ch = Self::channel(head).unwrap_or_default();
                match (&head[4..], arg) {
                    (":DISP?", _) => {
                        let state = if self.display[ch] { "ON" } else { "OFF" };
                        self.reply_line(state);
                    }
                    (":DISP", state) => self.display[ch] = state == "ON",
                    (":COUP?", _) => {
                        let coupling = self.coupling[ch].clone();
                        self.reply_line(coupling);
                    }
                    (":COUP", coupling) => self.coupling[ch] = coupling.to_string(),
                    (":PROB?", _) => {
                        let probe = self.probe[ch].clone();
                        self.reply_line(probe);
                    }
                    (":PROB", probe) => self.probe[ch] = probe.to_string(),
                    _ => {}
                }
            }
            // Generator settings and anything unknown are accepted silently.
            _ => {}
        }
    }

    fn set_mode(&mut self, mode: MeasurementMode) {
        self.mode = mode;
        self.milli_scale = false;
        self.range_position = 0;
    }
}

impl SimulatedHds {
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn with_model(model: &str) -> Self {
        let sim = Self::default();
        sim.state().model = model.to_string();
        sim
    }

    /// Every command line received so far.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    pub(crate) fn clear_commands(&self) {
        self.state().commands.clear();
    }

    /// Queue a reply for `command` that overrides the simulated one.
    pub(crate) fn script(&self, command: &str, reply: &str) {
        self.state()
            .scripted
            .entry(command.to_string())
            .or_default()
            .push_back(reply.to_string());
    }

    /// Never answer `command`.
    pub(crate) fn mute(&self, command: &str) {
        self.state().muted.insert(command.to_string());
    }

    pub(crate) fn set_mode(&self, mode: MeasurementMode) {
        self.state().set_mode(mode);
    }

    pub(crate) fn set_range_cycle(&self, mode: MeasurementMode, cycle: &[&str]) {
        self.state().range_cycles.insert(mode, labels(cycle));
    }

    pub(crate) fn set_range_position(&self, position: usize) {
        self.state().range_position = position;
    }

    pub(crate) fn set_samples(&self, samples: Vec<i16>) {
        self.state().samples = samples;
    }

    pub(crate) fn set_header(&self, header: &str) {
        self.state().header = header.to_string();
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&SimState) -> R) -> R {
        f(&self.state())
    }
}

impl tokio::io::AsyncRead for SimulatedHds {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let mut state = self.state();
        let c = buf.remaining().min(state.outbound.len());
        let chunk: Vec<u8> = state.outbound.drain(..c).collect();
        buf.put_slice(&chunk);
        std::task::Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for SimulatedHds {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::result::Result<usize, std::io::Error>> {
        let mut state = self.state();
        state.inbound.extend_from_slice(buf);
        while let Some(n) = state.inbound.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = state.inbound.drain(..=n).collect();
            let line = String::from_utf8_lossy(&line[..n]).trim().to_string();
            state.handle(&line);
        }
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}
