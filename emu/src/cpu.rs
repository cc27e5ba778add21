use arch::flag::Flag;
use arch::mnemonic::Mnemonic;
use arch::mode::Mode;

pub const STACK_PAGE: u16 = 0x0100;
pub const RAM_LEN: usize = 65536;

/// Register file plus RAM. Execution policy (batching, stop requests,
/// diagnostics) lives in [`crate::runner::Runner`]; this type only knows
/// how to run one opcode at a time.
pub struct Machine {
    a: u8,
    x: u8,
    y: u8,
    sr: u8,
    sp: u8,
    pc: u16,
    ram: Vec<u8>,
}

// Memory access
impl Machine {
    pub fn get_byte(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    pub fn set_byte(&mut self, addr: u16, val: u8) {
        self.ram[addr as usize] = val;
    }

    /// Read the byte at PC and advance past it.
    pub(crate) fn eat_byte(&mut self) -> u8 {
        let byte = self.ram[self.pc as usize];
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub(crate) fn set_pc(&mut self, val: u16) {
        self.pc = val;
    }
}

// Flags and stack
impl Machine {
    pub fn flag(&self, flag: Flag) -> bool {
        self.sr & flag.mask() != 0
    }

    fn put_flag(&mut self, flag: Flag, on: bool) {
        if on {
            self.sr |= flag.mask();
        } else {
            self.sr &= !flag.mask();
        }
    }

    fn nz(&mut self, val: u8) {
        self.put_flag(Flag::N, val & 0x80 != 0);
        self.put_flag(Flag::Z, val == 0);
    }

    fn push(&mut self, val: u8) {
        self.ram[(STACK_PAGE + self.sp as u16) as usize] = val;
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.ram[(STACK_PAGE + self.sp as u16) as usize]
    }
}

impl Machine {
    pub fn new() -> Self {
        let mut machine = Machine {
            a: 0,
            x: 0,
            y: 0,
            sr: 0,
            sp: 0,
            pc: 0,
            ram: vec![0; RAM_LEN],
        };
        machine.reset();
        machine
    }

    /// Zero everything, park SP at the top of the stack page and light
    /// only the reserved status bit.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sr = Flag::R.mask();
        self.sp = 0xFF;
        self.pc = 0;
    }

    /// Copy a program image into RAM and point PC at its first byte.
    pub fn burn(&mut self, bytes: &[u8], load_addr: u16) {
        for (i, byte) in bytes.iter().enumerate() {
            self.ram[load_addr.wrapping_add(i as u16) as usize] = *byte;
        }
        self.pc = load_addr;
    }
}

// Addressing mode resolvers. Zero-page indexing wraps at 8 bits, absolute
// indexing at 16. The indirect forms dereference a single byte, so their
// effective address always lands in page zero.
impl Machine {
    fn addr_zp(&mut self) -> u16 {
        self.eat_byte() as u16
    }

    fn addr_zpx(&mut self) -> u16 {
        self.eat_byte().wrapping_add(self.x) as u16
    }

    fn addr_zpy(&mut self) -> u16 {
        self.eat_byte().wrapping_add(self.y) as u16
    }

    fn addr_abs(&mut self) -> u16 {
        let lsb = self.eat_byte() as u16;
        let msb = self.eat_byte() as u16;
        msb << 8 | lsb
    }

    fn addr_abx(&mut self) -> u16 {
        self.addr_abs().wrapping_add(self.x as u16)
    }

    fn addr_aby(&mut self) -> u16 {
        self.addr_abs().wrapping_add(self.y as u16)
    }

    fn addr_ind(&mut self) -> u16 {
        let p = self.eat_byte();
        self.ram[p as usize] as u16
    }

    fn addr_idx(&mut self) -> u16 {
        let p = self.eat_byte().wrapping_add(self.x);
        self.ram[p as usize] as u16
    }

    fn addr_idy(&mut self) -> u16 {
        let p = self.eat_byte();
        (self.ram[p as usize] as u16).wrapping_add(self.y as u16)
    }

    fn effective_addr(&mut self, mode: Mode) -> u16 {
        match mode {
            Mode::ZeroPage => self.addr_zp(),
            Mode::ZeroPageX => self.addr_zpx(),
            Mode::ZeroPageY => self.addr_zpy(),
            Mode::Absolute => self.addr_abs(),
            Mode::AbsoluteX => self.addr_abx(),
            Mode::AbsoluteY => self.addr_aby(),
            Mode::Indirect => self.addr_ind(),
            Mode::IndirectX => self.addr_idx(),
            Mode::IndirectY => self.addr_idy(),
            Mode::Immediate | Mode::Implied | Mode::Accumulator | Mode::Relative => {
                unreachable!("mode `{}` has no effective address", mode)
            }
        }
    }

    fn fetch(&mut self, mode: Mode) -> u8 {
        match mode {
            Mode::Immediate => self.eat_byte(),
            Mode::Accumulator => self.a,
            _ => {
                let addr = self.effective_addr(mode);
                self.ram[addr as usize]
            }
        }
    }

    /// Read-modify-write helper for the shift family: `f` maps the old
    /// value to the new one, writing back to A or to memory.
    fn modify(&mut self, mode: Mode, f: impl FnOnce(&mut Self, u8) -> u8) {
        if mode == Mode::Accumulator {
            let r = f(self, self.a);
            self.a = r;
        } else {
            let addr = self.effective_addr(mode);
            let m = self.ram[addr as usize];
            let r = f(self, m);
            self.ram[addr as usize] = r;
        }
    }
}

// Instruction set
impl Machine {
    /// Run one already-decoded opcode. The opcode byte itself has been
    /// consumed; operand bytes are consumed here.
    pub(crate) fn execute(&mut self, mnemonic: Mnemonic, mode: Mode) {
        use Mnemonic::*;
        match mnemonic {
            ADC => {
                let m = self.fetch(mode);
                self.adc(m);
            }
            AND => {
                self.a &= self.fetch(mode);
                let a = self.a;
                self.nz(a);
            }
            ASL => self.modify(mode, |cpu, m| {
                cpu.put_flag(Flag::C, m & 0x80 != 0);
                let r = m << 1;
                cpu.nz(r);
                r
            }),
            BCC => self.branch(!self.flag(Flag::C)),
            BCS => self.branch(self.flag(Flag::C)),
            BEQ => self.branch(self.flag(Flag::Z)),
            BMI => self.branch(self.flag(Flag::N)),
            BNE => self.branch(!self.flag(Flag::Z)),
            BPL => self.branch(!self.flag(Flag::N)),
            BVC => self.branch(!self.flag(Flag::V)),
            BVS => self.branch(self.flag(Flag::V)),
            BIT => {
                let t = self.a & self.fetch(mode);
                self.put_flag(Flag::N, t & 0x80 != 0);
                self.put_flag(Flag::V, t & 0x40 != 0);
                self.put_flag(Flag::Z, t == 0);
            }
            BRK => self.put_flag(Flag::B, true),
            CLC => self.put_flag(Flag::C, false),
            CLD => self.put_flag(Flag::D, false),
            CLI => self.put_flag(Flag::I, false),
            CLV => self.put_flag(Flag::V, false),
            CMP => {
                let m = self.fetch(mode);
                self.compare(self.a, m);
            }
            CPX => {
                let m = self.fetch(mode);
                self.compare(self.x, m);
            }
            CPY => {
                let m = self.fetch(mode);
                self.compare(self.y, m);
            }
            DEC => self.modify(mode, |cpu, m| {
                let r = m.wrapping_sub(1);
                cpu.nz(r);
                r
            }),
            DEX => {
                self.x = self.x.wrapping_sub(1);
                let x = self.x;
                self.nz(x);
            }
            DEY => {
                self.y = self.y.wrapping_sub(1);
                let y = self.y;
                self.nz(y);
            }
            EOR => {
                self.a ^= self.fetch(mode);
                let a = self.a;
                self.nz(a);
            }
            INC => self.modify(mode, |cpu, m| {
                let r = m.wrapping_add(1);
                cpu.nz(r);
                r
            }),
            INX => {
                self.x = self.x.wrapping_add(1);
                let x = self.x;
                self.nz(x);
            }
            INY => {
                self.y = self.y.wrapping_add(1);
                let y = self.y;
                self.nz(y);
            }
            JMP => {
                // Indirect JMP lands on the byte value stored at the
                // dereferenced cell, a historical quirk kept as-is.
                let addr = self.effective_addr(mode);
                self.pc = if mode == Mode::Indirect {
                    self.ram[addr as usize] as u16
                } else {
                    addr
                };
            }
            JSR => {
                let addr = self.addr_abs();
                let ret = self.pc.wrapping_sub(1);
                self.push((ret >> 8) as u8);
                self.push((ret & 0xFF) as u8);
                self.pc = addr;
            }
            LDA => {
                self.a = self.fetch(mode);
                let a = self.a;
                self.nz(a);
            }
            LDX => {
                self.x = self.fetch(mode);
                let x = self.x;
                self.nz(x);
            }
            LDY => {
                self.y = self.fetch(mode);
                let y = self.y;
                self.nz(y);
            }
            LSR => self.modify(mode, |cpu, m| {
                cpu.put_flag(Flag::C, m & 0x01 != 0);
                let r = m >> 1;
                cpu.nz(r);
                r
            }),
            NOP => {}
            ORA => {
                self.a |= self.fetch(mode);
                let a = self.a;
                self.nz(a);
            }
            PHA => {
                let a = self.a;
                self.push(a);
            }
            PHP => {
                let sr = self.sr;
                self.push(sr);
            }
            PLA => {
                self.a = self.pop();
                let a = self.a;
                self.nz(a);
            }
            PLP => self.sr = self.pop(),
            ROL => self.modify(mode, |cpu, m| {
                let carry_in = cpu.flag(Flag::C) as u8;
                cpu.put_flag(Flag::C, m & 0x80 != 0);
                let r = m << 1 | carry_in;
                cpu.nz(r);
                r
            }),
            ROR => self.modify(mode, |cpu, m| {
                let carry_in = cpu.flag(Flag::C) as u8;
                cpu.put_flag(Flag::C, m & 0x01 != 0);
                let r = m >> 1 | carry_in << 7;
                cpu.nz(r);
                r
            }),
            RTI => {
                self.sr = self.pop();
                let lsb = self.pop() as u16;
                let msb = self.pop() as u16;
                self.pc = (msb << 8 | lsb).wrapping_add(1);
            }
            RTS => {
                let lsb = self.pop() as u16;
                let msb = self.pop() as u16;
                self.pc = (msb << 8 | lsb).wrapping_add(1);
            }
            SBC => {
                let m = self.fetch(mode);
                self.sbc(m);
            }
            SEC => self.put_flag(Flag::C, true),
            SED => self.put_flag(Flag::D, true),
            SEI => self.put_flag(Flag::I, true),
            STA => {
                let addr = self.effective_addr(mode);
                self.ram[addr as usize] = self.a;
            }
            STX => {
                let addr = self.effective_addr(mode);
                self.ram[addr as usize] = self.x;
            }
            STY => {
                let addr = self.effective_addr(mode);
                self.ram[addr as usize] = self.y;
            }
            TAX => {
                self.x = self.a;
                let x = self.x;
                self.nz(x);
            }
            TAY => {
                self.y = self.a;
                let y = self.y;
                self.nz(y);
            }
            TSX => {
                self.x = self.sp;
                let x = self.x;
                self.nz(x);
            }
            TXA => {
                self.a = self.x;
                let a = self.a;
                self.nz(a);
            }
            TXS => self.sp = self.x,
            TYA => {
                self.a = self.y;
                let a = self.a;
                self.nz(a);
            }
        }
    }

    fn adc(&mut self, m: u8) {
        let sum = self.a as u16 + m as u16 + self.flag(Flag::C) as u16;
        let r = (sum & 0xFF) as u8;
        self.put_flag(Flag::V, (self.a ^ r) & 0x80 != 0);
        self.put_flag(Flag::C, sum > 0xFF);
        self.nz(r);
        self.a = r;
    }

    // No decimal mode: D is a plain storable bit with no effect.
    fn sbc(&mut self, m: u8) {
        let borrow = !self.flag(Flag::C) as i16;
        let diff = self.a as i16 - m as i16 - borrow;
        self.put_flag(Flag::V, diff > 127 || diff < -129);
        self.put_flag(Flag::C, diff >= 0);
        let r = (diff & 0xFF) as u8;
        self.put_flag(Flag::N, r & 0x80 != 0);
        self.put_flag(Flag::Z, diff == 0);
        self.a = r;
    }

    fn compare(&mut self, reg: u8, m: u8) {
        let t = reg.wrapping_sub(m);
        self.put_flag(Flag::N, t & 0x80 != 0);
        self.put_flag(Flag::C, reg >= m);
        self.put_flag(Flag::Z, t == 0);
    }

    /// The displacement byte is consumed whether or not the branch is
    /// taken; a taken branch offsets the PC that follows it.
    fn branch(&mut self, cond: bool) {
        let offset = self.eat_byte();
        if cond {
            self.pc = self.pc.wrapping_add(offset as i8 as u16);
        }
    }
}

// Dumps
impl Machine {
    /// One register per line. SR is a bit string printed lowest bit
    /// first, matching the flag index order.
    pub fn dump_registers(&self) -> String {
        let sr: String = (0..8).map(|i| if self.sr >> i & 1 != 0 { '1' } else { '0' }).collect();
        format!(
            "A: ${:02X}\nX: ${:02X}\nY: ${:02X}\nSR: {}\nPC: ${:04X}\nSP: ${:02X}\n",
            self.a, self.x, self.y, sr, self.pc, self.sp
        )
    }

    pub fn dump_memory(&self, from: u16, count: usize, columns: usize) -> String {
        let mut str = String::new();
        let mut col = 0;
        for index in 0..count {
            let addr = from.wrapping_add(index as u16);
            str.push_str(&format!("{:02X}", self.ram[addr as usize]));
            col += 1;
            if col == columns {
                str.push('\n');
                col = 0;
            } else {
                str.push(' ');
            }
        }
        str
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Mnemonic::*;

    fn exec(machine: &mut Machine, program: &[u8]) {
        machine.burn(program, 0);
        while !machine.flag(Flag::B) {
            let opcode = machine.eat_byte();
            let (mnemonic, mode) = arch::opcode::decode(opcode).unwrap();
            machine.execute(mnemonic, mode);
        }
    }

    #[test]
    fn lda_sets_n_and_z() {
        let mut m = Machine::new();
        m.burn(&[0xA9, 0x00, 0xA9, 0x80], 0);
        m.eat_byte();
        m.execute(LDA, Mode::Immediate);
        assert!(m.flag(Flag::Z));
        assert!(!m.flag(Flag::N));
        m.eat_byte();
        m.execute(LDA, Mode::Immediate);
        assert!(!m.flag(Flag::Z));
        assert!(m.flag(Flag::N));
    }

    #[test]
    fn adc_carry_and_wrap() {
        let mut m = Machine::new();
        // LDA #$FF / ADC #$02 -> A = $01, carry out
        exec(&mut m, &[0xA9, 0xFF, 0x69, 0x02, 0x00]);
        assert_eq!(m.a, 0x01);
        assert!(m.flag(Flag::C));
        assert!(!m.flag(Flag::Z));
    }

    #[test]
    fn sbc_borrow() {
        let mut m = Machine::new();
        // SEC / LDA #$05 / SBC #$07 -> A = $FE, borrow (C clear)
        exec(&mut m, &[0x38, 0xA9, 0x05, 0xE9, 0x07, 0x00]);
        assert_eq!(m.a, 0xFE);
        assert!(!m.flag(Flag::C));
        assert!(m.flag(Flag::N));
    }

    #[test]
    fn compare_sets_carry_on_greater_or_equal() {
        let mut m = Machine::new();
        exec(&mut m, &[0xA9, 0x10, 0xC9, 0x10, 0x00]);
        assert!(m.flag(Flag::C));
        assert!(m.flag(Flag::Z));
        let mut m = Machine::new();
        exec(&mut m, &[0xA9, 0x0F, 0xC9, 0x10, 0x00]);
        assert!(!m.flag(Flag::C));
        assert!(!m.flag(Flag::Z));
    }

    #[test]
    fn ror_rotates_carry_into_bit7() {
        let mut m = Machine::new();
        // SEC / LDA #$02 / ROR A -> A = $81, C clear
        exec(&mut m, &[0x38, 0xA9, 0x02, 0x6A, 0x00]);
        assert_eq!(m.a, 0x81);
        assert!(!m.flag(Flag::C));
        assert!(m.flag(Flag::N));
    }

    #[test]
    fn lsr_clears_n() {
        let mut m = Machine::new();
        exec(&mut m, &[0xA9, 0x81, 0x4A, 0x00]);
        assert_eq!(m.a, 0x40);
        assert!(m.flag(Flag::C));
        assert!(!m.flag(Flag::N));
    }

    #[test]
    fn jsr_rts_round_trip() {
        let mut m = Machine::new();
        // JSR $0006 / LDX #$01 / BRK ... SUB: LDA #$42 / RTS
        exec(
            &mut m,
            &[0x20, 0x06, 0x00, 0xA2, 0x01, 0x00, 0xA9, 0x42, 0x60],
        );
        assert_eq!(m.a, 0x42);
        assert_eq!(m.x, 0x01);
        assert_eq!(m.sp, 0xFF);
    }

    #[test]
    fn stack_lives_in_page_one() {
        let mut m = Machine::new();
        // LDA #$7A / PHA
        exec(&mut m, &[0xA9, 0x7A, 0x48, 0x00]);
        assert_eq!(m.get_byte(STACK_PAGE + 0xFF), 0x7A);
        assert_eq!(m.sp, 0xFE);
    }

    #[test]
    fn zero_page_indexed_wraps_at_eight_bits() {
        let mut m = Machine::new();
        // LDX #$05 / LDA #$33 / STA $FE,X -> lands at $03, not $0103
        exec(&mut m, &[0xA2, 0x05, 0xA9, 0x33, 0x95, 0xFE, 0x00]);
        assert_eq!(m.get_byte(0x0003), 0x33);
        assert_eq!(m.get_byte(0x0103), 0x00);
    }

    #[test]
    fn indirect_jmp_double_dereference() {
        let mut m = Machine::new();
        let mut program = vec![0u8; 0x40];
        // JMP ($0030): RAM[$30] = $20, RAM[$20] = $05 -> PC lands at $05
        program[0] = 0x6C;
        program[1] = 0x30;
        program[2] = 0x00;
        program[0x30] = 0x20;
        program[0x20] = 0x05;
        program[0x05] = 0x00; // BRK
        exec(&mut m, &program);
        // BRK at $05 leaves PC one past it
        assert_eq!(m.pc(), 0x06);
    }

    #[test]
    fn backward_branch_loops() {
        let mut m = Machine::new();
        // Sum 5+4+3+2+1 into $11 via a DEX/BNE loop
        exec(
            &mut m,
            &[
                0xA2, 0x05, 0xA9, 0x00, 0x18, 0x86, 0x10, 0x65, 0x10, 0xCA, 0xD0, 0xF9, 0x85,
                0x11, 0x00,
            ],
        );
        assert_eq!(m.get_byte(0x11), 15);
    }

    #[test]
    fn bit_reflects_masked_accumulator() {
        let mut m = Machine::new();
        // $10 holds $C0; A = $C0 -> t = $C0: N and V set, Z clear
        let mut program = vec![0xA9, 0xC0, 0x24, 0x10, 0x00];
        program.resize(0x20, 0);
        program[0x10] = 0xC0;
        exec(&mut m, &program);
        assert!(m.flag(Flag::N));
        assert!(m.flag(Flag::V));
        assert!(!m.flag(Flag::Z));
    }

    #[test]
    fn reset_state() {
        let mut m = Machine::new();
        exec(&mut m, &[0xA9, 0x10, 0x85, 0x00, 0x00]);
        m.reset();
        assert_eq!(m.a, 0);
        assert_eq!(m.sp, 0xFF);
        assert_eq!(m.pc(), 0);
        assert_eq!(m.get_byte(0x0000), 0);
        assert!(m.flag(Flag::R));
        assert!(!m.flag(Flag::B));
    }

    #[test]
    fn register_dump_format() {
        let m = Machine::new();
        let dump = m.dump_registers();
        assert!(dump.starts_with("A: $00\nX: $00\nY: $00\nSR: 00100000\n"));
        assert!(dump.ends_with("PC: $0000\nSP: $FF\n"));
    }

    #[test]
    fn memory_dump_rows() {
        let mut m = Machine::new();
        m.set_byte(0x0000, 0xAB);
        let dump = m.dump_memory(0, 4, 2);
        assert_eq!(dump, "AB 00\n00 00\n");
    }
}
