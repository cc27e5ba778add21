use arch::flag::Flag;
use arch::opcode;

use crate::cpu::Machine;

/// Instructions per burst before yielding back to the host scheduler.
pub const BATCH_LEN: usize = 0xFF;

/// Why a burst ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    /// The batch ran dry with the program still live.
    Yield,
    /// BRK raised the Break flag.
    Halted,
    /// A stop request landed; PC has been reset to zero.
    Stopped,
    /// A pause request landed; PC stays put.
    Paused,
}

/// Execution loop around a [`Machine`]. Stop and pause requests are
/// observed only at opcode boundaries, so an instruction that has started
/// always completes.
pub struct Runner {
    pub cpu: Machine,
    stop_req: bool,
    pause_req: bool,
    logs: Vec<String>,
}

impl Runner {
    pub fn new() -> Self {
        Runner {
            cpu: Machine::new(),
            stop_req: true,
            pause_req: true,
            logs: vec![],
        }
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
        self.stop_req = true;
        self.pause_req = true;
    }

    /// Request a stop; honored after the current opcode.
    pub fn stop(&mut self) {
        self.stop_req = true;
    }

    /// Request a pause; honored after the current opcode.
    pub fn pause(&mut self) {
        self.pause_req = true;
    }

    pub fn is_running(&self) -> bool {
        !self.stop_req && !self.pause_req
    }

    /// Execute at most [`BATCH_LEN`] instructions. Undecodable bytes are
    /// logged and skipped; execution continues at the next byte.
    pub fn burst(&mut self) -> Burst {
        let mut count = 0;
        while count < BATCH_LEN {
            if self.cpu.flag(Flag::B) {
                self.logs
                    .push(format!("Program terminated at ${:04X}", self.cpu.pc()));
                return Burst::Halted;
            }
            let byte = self.cpu.eat_byte();
            match opcode::decode(byte) {
                Some((mnemonic, mode)) => self.cpu.execute(mnemonic, mode),
                None => self.logs.push(format!(
                    "Invalid OpCode ${:02X} at instruction address ${:04X}",
                    byte,
                    self.cpu.pc().wrapping_sub(1)
                )),
            }
            if self.stop_req {
                self.logs
                    .push(format!("Program stopped at ${:04X}", self.cpu.pc()));
                self.cpu.set_pc(0);
                return Burst::Stopped;
            }
            if self.pause_req {
                return Burst::Paused;
            }
            count += 1;
        }
        Burst::Yield
    }

    /// Clear pending requests so bursts can proceed. For hosts that
    /// drive [`Self::burst`] themselves.
    pub fn start(&mut self) {
        self.stop_req = false;
        self.pause_req = false;
    }

    /// Synchronous driver: burst until something other than a yield.
    pub fn run(&mut self) -> Burst {
        self.start();
        loop {
            match self.burst() {
                Burst::Yield => continue,
                outcome => return outcome,
            }
        }
    }

    /// Execute exactly one opcode.
    pub fn step(&mut self) -> Burst {
        self.stop_req = false;
        self.pause_req = true;
        self.burst()
    }

    /// Most recent diagnostic line, if any.
    pub fn pop_log(&mut self) -> Option<String> {
        self.logs.pop()
    }

    /// Drain all diagnostics, oldest first.
    pub fn drain_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}
