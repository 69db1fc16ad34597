//! Functional laws checked over generated programs.

use std::collections::BTreeMap;

use proptest::prelude::*;
use tomasim_core::common::Reg;
use tomasim_core::isa::{Instruction, Opcode};
use tomasim_core::{CoreConfig, InitialState};

use crate::common::*;

const INT_OPS: [Opcode; 9] = [
    Opcode::Dadd,
    Opcode::Dsub,
    Opcode::Dmul,
    Opcode::Ddiv,
    Opcode::And,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Slt,
    Opcode::Dsll,
];

/// Sequential reference for the integer ALU subset.
fn reference_step(regs: &mut [i64; 8], op: Opcode, d: usize, a: usize, b: usize, imm: i64) {
    let x = regs[a];
    let y = regs[b];
    let result = match op {
        Opcode::Dadd => x.wrapping_add(y),
        Opcode::Dsub => x.wrapping_sub(y),
        Opcode::Dmul => x.wrapping_mul(y),
        Opcode::Ddiv => {
            if y == 0 {
                0
            } else {
                x.wrapping_div(y)
            }
        }
        Opcode::And => x & y,
        Opcode::Or => x | y,
        Opcode::Xor => x ^ y,
        Opcode::Slt => i64::from(x < y),
        Opcode::Dsll => ((x as u64) << (y & 63)) as i64,
        Opcode::Dsrl => ((x as u64) >> (y & 63)) as i64,
        Opcode::Daddi => x.wrapping_add(imm),
        Opcode::Dsubi => x.wrapping_sub(imm),
        _ => unreachable!("not an integer ALU opcode"),
    };
    if d != 0 {
        regs[d] = result;
    }
}

fn arith_inst() -> impl Strategy<Value = (usize, usize, usize, usize, i64)> {
    // (op index into INT_OPS + 2 immediate forms, dest, src1, src2, imm)
    (0usize..INT_OPS.len() + 2, 0usize..8, 0usize..8, 0usize..8, -100i64..100)
}

proptest! {
    /// The out-of-order core computes exactly what in-order execution
    /// computes, for any short integer program.
    #[test]
    fn matches_sequential_reference(insts in prop::collection::vec(arith_inst(), 1..12)) {
        let mut regs = [0i64; 8];
        let mut program = Vec::new();
        for &(op_idx, d, a, b, imm) in &insts {
            if op_idx < INT_OPS.len() {
                let op = INT_OPS[op_idx];
                program.push(Instruction::alu(op, Reg::int(d), Reg::int(a), Reg::int(b)));
                reference_step(&mut regs, op, d, a, b, 0);
            } else {
                let op = if op_idx == INT_OPS.len() { Opcode::Daddi } else { Opcode::Dsubi };
                program.push(Instruction::alu_imm(op, Reg::int(d), Reg::int(a), imm));
                reference_step(&mut regs, op, d, a, 0, imm);
            }
        }

        let (sim, _) = run_checked(program, CoreConfig::default(), &InitialState::new(), 2_000);
        for (i, &expected) in regs.iter().enumerate() {
            prop_assert_eq!(int(&sim, i), expected, "R{} diverged", i);
        }
    }

    /// Doubling the integer latency never makes a dependent chain finish
    /// earlier.
    #[test]
    fn doubling_latency_is_monotone(latency in 1u64..6) {
        let chain = vec![
            daddi(1, 0, 1),
            dadd(2, 1, 1),
            dadd(3, 2, 2),
            dadd(4, 3, 3),
            dadd(5, 4, 4),
        ];

        let mut config = CoreConfig::default();
        config.latency.int_alu = latency;
        let (base, _) = run_checked(chain.clone(), config, &InitialState::new(), 2_000);

        let mut config = CoreConfig::default();
        config.latency.int_alu = latency * 2;
        let (doubled, _) = run_checked(chain, config, &InitialState::new(), 2_000);

        prop_assert!(doubled.core.cycle() >= base.core.cycle());
        prop_assert_eq!(int(&base, 5), 16);
        prop_assert_eq!(int(&doubled, 5), 16);
    }

    /// A load observes the youngest earlier store to its address, or the
    /// pre-initialized value when no store precedes it.
    #[test]
    fn loads_observe_sequence_order(
        stores in prop::collection::vec((0usize..3, 1usize..5), 0..5),
        load_slot in 0usize..3,
    ) {
        let addrs = [100u64, 108, 120];
        let fp_init = [0.0, 10.0, 2.0, 3.0, 4.0]; // F0 unused, F1..F4 textbook

        let mut expected: BTreeMap<u64, f64> =
            [(100, 1.0), (108, 2.0), (120, 3.0)].into_iter().collect();

        let mut program = Vec::new();
        for &(slot, src) in &stores {
            program.push(sd(src, 2, addrs[slot] as i64 - 100));
            let _ = expected.insert(addrs[slot], fp_init[src]);
        }
        program.push(ld(6, 2, addrs[load_slot] as i64 - 100));

        let (sim, _) = run_checked(program, CoreConfig::default(), &textbook_init(), 5_000);

        prop_assert_eq!(fp(&sim, 6), expected[&addrs[load_slot]]);
        for (&addr, &value) in &expected {
            prop_assert_eq!(sim.core.peek_f64(addr), value, "memory at {} diverged", addr);
        }
    }
}
