use emu65::{Burst, Reply, Request, Runner, Worker};

fn run(source: &str) -> Runner {
    let object = asm65::assemble(source).unwrap();
    let mut runner = Runner::new();
    runner.cpu.burn(&object.bytes, 0);
    assert_eq!(runner.run(), Burst::Halted);
    runner
}

#[test]
fn store_round_trip() {
    let runner = run("LDA #$01\nSTA $00\nBRK");
    assert_eq!(runner.cpu.get_byte(0x0000), 0x01);
}

#[test]
fn sum_loop() {
    let runner = run(
        "LDX #$05\n\
         LDA #$00\n\
         CLC\n\
         LOOP:\n\
         STX $10\n\
         ADC $10\n\
         DEX\n\
         BNE LOOP\n\
         STA $11\n\
         BRK",
    );
    assert_eq!(runner.cpu.get_byte(0x11), 15);
}

#[test]
fn subroutine_with_constant_table() {
    let runner = run(
        "DST = $0040\n\
         JSR COPY\n\
         BRK\n\
         COPY:\n\
         LDA #$5A\n\
         STA DST\n\
         RTS",
    );
    assert_eq!(runner.cpu.get_byte(0x0040), 0x5A);
}

#[test]
fn forward_branch_skips() {
    let runner = run(
        "LDA #$01\n\
         BEQ MISS\n\
         LDA #$02\n\
         MISS:\n\
         STA $30\n\
         BRK",
    );
    assert_eq!(runner.cpu.get_byte(0x30), 0x02);
}

#[test]
fn data_directive_is_readable() {
    let runner = run(
        "LDA $0006\n\
         STA $20\n\
         BRK\n\
         .BYTE $99",
    );
    assert_eq!(runner.cpu.get_byte(0x20), 0x99);
}

#[test]
fn worker_channel_flow() {
    let object = asm65::assemble("LDA #$07\nSTA $10\nBRK").unwrap();
    let worker = Worker::spawn();
    assert_eq!(worker.recv(), Some(Reply::Connected));

    worker.send(Request::Ram(object.bytes));
    assert!(matches!(worker.recv(), Some(Reply::RegDump(_))));

    worker.send(Request::Run);
    match worker.recv() {
        Some(Reply::RegDump(dump)) => assert!(dump.contains("A: $07")),
        other => panic!("expected regdump, got {:?}", other),
    }
    assert_eq!(worker.recv(), Some(Reply::Finish));

    worker.send(Request::Reset);
    match worker.recv() {
        Some(Reply::RegDump(dump)) => assert!(dump.contains("PC: $0000")),
        other => panic!("expected regdump, got {:?}", other),
    }
}
