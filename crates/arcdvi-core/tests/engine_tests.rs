//! Probe engine: classification, output synthesis, change suppression and
//! register programming.

mod common;

use arcdvi_core::engine::{
    classify, doubled_line_width, is_hires, synthesize, DOUBLING_CANDIDATES, HIRES_CURSOR_OFFSET,
};
use arcdvi_core::pll::PllConfigWord;
use arcdvi_core::presets::{Depth, Preset};
use arcdvi_core::regs;
use arcdvi_core::{Classification, MultiplierClass, ProbeEngine, ProbeOutcome, TimingDescriptor};
use common::*;

fn make_engine() -> (ProbeEngine<MockFpga, MockDelay>, MockFpga) {
    let fpga = MockFpga::new();
    let engine = ProbeEngine::new(fpga.clone(), MockDelay::default());
    (engine, fpga)
}

fn timing(xres: u32, yres: u32, bpp_class: u8, pixel_rate_mhz: u32) -> TimingDescriptor {
    TimingDescriptor {
        xres,
        yres,
        bpp_class,
        pixel_rate_mhz,
        h_front_porch: 16,
        h_sync_width: 72,
        h_back_porch: 88,
        v_front_porch: 3,
        v_sync_width: 3,
        v_back_porch: 16,
        extended_palette: false,
    }
}

// ============================================================================
// Classification
// ============================================================================

mod classification_tests {
    use super::*;

    #[test]
    fn every_geometry_gets_exactly_one_bucket() {
        for &rate in &[8, 12, 16, 24] {
            for bpp in 0..=4u8 {
                for xres in (1..=1400).step_by(13) {
                    for yres in (1..=1100).step_by(17) {
                        let t = timing(xres, yres, bpp, rate);
                        let hires = rate == 24 && bpp == 2 && xres < yres / 2;
                        let pass = !hires && yres >= 480;
                        let expected = if hires {
                            Classification::HighRes
                        } else if pass {
                            Classification::Passthrough
                        } else {
                            Classification::Doubling {
                                horizontal: xres < 640,
                            }
                        };
                        assert_eq!(classify(&t), expected, "{xres}x{yres} bpp {bpp} {rate}MHz");
                    }
                }
            }
        }
    }

    #[test]
    fn vga_boundary_is_passthrough() {
        assert_eq!(classify(&timing(640, 480, 3, 24)), Classification::Passthrough);
        assert_eq!(classify(&timing(639, 480, 3, 24)), Classification::Passthrough);
        assert_eq!(
            classify(&timing(639, 479, 3, 24)),
            Classification::Doubling { horizontal: true }
        );
        assert_eq!(
            classify(&timing(640, 479, 3, 24)),
            Classification::Doubling { horizontal: false }
        );
    }

    #[test]
    fn hires_signature_is_narrow() {
        assert!(is_hires(&timing(288, 1024, 2, 24)));
        assert!(!is_hires(&timing(288, 1024, 3, 24)), "wrong depth");
        assert!(!is_hires(&timing(288, 1024, 2, 16)), "wrong clock");
        assert!(!is_hires(&timing(512, 1024, 2, 24)), "not tall enough");
    }
}

// ============================================================================
// Output synthesis
// ============================================================================

mod synthesis_tests {
    use super::*;

    #[test]
    fn passthrough_keeps_observed_timing() {
        let observed = timing(800, 600, 3, 24);
        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.timing, observed);
        assert_eq!(mode.multiplier, MultiplierClass::X1);
        assert!(!mode.double_x && !mode.double_y && !mode.hires);
    }

    #[test]
    fn hires_scales_horizontal_by_four() {
        let observed = timing(288, 1024, 2, 24);
        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.timing.xres, 1152);
        assert_eq!(mode.timing.h_front_porch, 64);
        assert_eq!(mode.timing.h_sync_width, 288);
        assert_eq!(mode.timing.h_back_porch, 352);
        assert_eq!(mode.timing.yres, 1024);
        assert_eq!(mode.timing.v_back_porch, 16);
        assert_eq!(mode.timing.bpp_class, 0);
        assert_eq!(mode.multiplier, MultiplierClass::X4);
        assert_eq!(mode.cursor_offset, HIRES_CURSOR_OFFSET);
        assert_eq!(mode.words_per_line_m1, 1152 / 32 - 1);
        assert!(mode.hires);
        assert_ne!(mode.control_word() & regs::VIDO_CTRL_HIRES, 0);
    }

    #[test]
    fn line_doubles_640x256_at_first_candidate() {
        let mut observed = timing(640, 256, 2, 8);
        observed.h_front_porch = 109;
        observed.h_sync_width = 72;
        observed.h_back_porch = 75;
        assert_eq!(observed.total_width(), 896);

        let mode = synthesize(&observed, classify(&observed));

        // 896 * 24 / 8 / 2 = 1344 >= 640 + 20
        assert_eq!(mode.timing.total_width(), 1344);
        assert_eq!(mode.timing.xres, 640);
        assert_eq!(mode.timing.yres, 512);
        assert_eq!(mode.timing.v_front_porch, 6);
        assert_eq!(mode.timing.v_sync_width, 6);
        assert_eq!(mode.timing.v_back_porch, 32);
        assert_eq!(mode.timing.h_front_porch, 1344 / 20);
        assert_eq!(mode.timing.h_sync_width, 1344 / 40);
        assert_eq!(mode.timing.h_back_porch, 1344 - 640 - 67 - 33);
        assert_eq!(mode.multiplier, MultiplierClass::X1);
        assert_eq!(mode.multiplier.tenths(), 10);
        assert!(mode.double_y && !mode.double_x);
        assert_eq!(mode.words_per_line_m1, observed.words_per_line_m1());
    }

    #[test]
    fn narrow_modes_double_both_axes() {
        let mut observed = timing(320, 256, 3, 8);
        observed.h_front_porch = 117;
        observed.h_sync_width = 36;
        observed.h_back_porch = 39;

        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.timing.xres, 640);
        assert_eq!(mode.timing.yres, 512);
        assert_eq!(mode.timing.total_width(), 768);
        assert!(mode.double_x && mode.double_y);
        assert_eq!(mode.words_per_line_m1, 320 / 4 - 1, "DMA reads the input line");
    }

    #[test]
    fn wide_line_steps_up_the_clock() {
        // At 16MHz, 1024 clocks: 24MHz gives 768 < 792 + 24, 36MHz gives 1152.
        let mut observed = timing(792, 256, 3, 16);
        observed.h_front_porch = 100;
        observed.h_sync_width = 72;
        observed.h_back_porch = 60;
        assert_eq!(observed.total_width(), 1024);

        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.multiplier, MultiplierClass::X1_5);
        assert_eq!(mode.timing.total_width(), 1152);
        assert_eq!(mode.timing.pixel_rate_mhz, 36);
    }

    #[test]
    fn falls_back_to_undoubled_when_no_clock_fits() {
        // A 24MHz line with almost no blanking can't be halved even at 48MHz.
        let mut observed = timing(1000, 300, 3, 24);
        observed.h_front_porch = 4;
        observed.h_sync_width = 4;
        observed.h_back_porch = 4;

        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.timing, observed);
        assert_eq!(mode.multiplier, MultiplierClass::X1);
        assert!(!mode.double_y);
    }

    #[test]
    fn tall_narrow_modes_pass_through() {
        let observed = timing(320, 480, 3, 12);
        assert_eq!(classify(&observed), Classification::Passthrough);

        let mode = synthesize(&observed, classify(&observed));
        assert_eq!(mode.timing, observed);
        assert!(!mode.double_x && !mode.double_y);

        // Asked to double anyway, synthesis still refuses.
        let forced = synthesize(&observed, Classification::Doubling { horizontal: true });
        assert_eq!(forced, mode);
    }

    #[test]
    fn blanking_starved_line_reaches_last_candidate() {
        // 800 clocks at 24MHz: 400 and 600 are both under 640 + 20.
        let mut observed = timing(640, 256, 3, 24);
        observed.h_front_porch = 40;
        observed.h_sync_width = 40;
        observed.h_back_porch = 80;
        assert_eq!(observed.total_width(), 800);

        let mode = synthesize(&observed, classify(&observed));

        assert_eq!(mode.multiplier, MultiplierClass::X2);
        assert_eq!(mode.timing.total_width(), 800);
        assert_eq!(mode.timing.pixel_rate_mhz, 48);
        assert_eq!(mode.timing.h_front_porch, 40);
        assert_eq!(mode.timing.h_sync_width, 20);
        assert_eq!(mode.timing.h_back_porch, 100);
        assert!(mode.double_y && !mode.double_x);
    }

    #[test]
    fn unknown_depth_does_not_panic() {
        let observed = timing(640, 480, 7, 24);
        let mode = synthesize(&observed, classify(&observed));
        assert_eq!(mode.words_per_line_m1, 0);
    }

    #[test]
    fn doubling_width_is_monotonic_in_candidate_rate() {
        for total in [0, 1, 100, 512, 896, 1024, 1274, 4000] {
            for observed in [8, 12, 16, 24] {
                let widths: Vec<u32> = DOUBLING_CANDIDATES
                    .iter()
                    .map(|&(pclk, _)| doubled_line_width(total, observed, pclk))
                    .collect();
                assert!(
                    widths.windows(2).all(|w| w[0] <= w[1]),
                    "total {total} at {observed}MHz: {widths:?}"
                );
            }
        }
    }

    #[test]
    fn doubling_width_truncates() {
        assert_eq!(doubled_line_width(896, 8, 24), 1344);
        assert_eq!(doubled_line_width(1001, 16, 24), 750);
        assert_eq!(doubled_line_width(1000, 0, 24), 0);
    }
}

// ============================================================================
// Probe cycle
// ============================================================================

mod probe_tests {
    use super::*;

    #[test]
    fn first_probe_programs_passthrough() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_800x600());

        let outcome = engine.probe(false);

        let ProbeOutcome::Reprogrammed {
            classification,
            mode,
        } = outcome
        else {
            panic!("expected reprogram, got {outcome:?}");
        };
        assert_eq!(classification, Classification::Passthrough);
        assert_eq!(mode.timing.xres, 800);
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(800));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_FP), Some(41));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_WIDTH), Some(128));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_BP), Some(87));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_Y), Some(600));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_VS_FP), Some(1));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_VS_WIDTH), Some(4));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_VS_BP), Some(23));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_WPLM1), Some(199));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_CTRL), Some((215 - 6) | (3 << 28)));
        assert_eq!(engine.state().multiplier(), Some(MultiplierClass::X1));
    }

    #[test]
    fn unchanged_input_writes_nothing() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_640x256_8mhz());

        assert!(matches!(engine.probe(false), ProbeOutcome::Reprogrammed { .. }));
        fpga.clear_writes();

        assert_eq!(engine.probe(false), ProbeOutcome::Unchanged);
        assert!(fpga.writes().is_empty(), "writes: {:x?}", fpga.writes());
    }

    #[test]
    fn changed_input_reprograms() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_640x256_8mhz());
        engine.probe(false);

        fpga.load_input(&mode_800x600());
        fpga.clear_writes();

        assert!(matches!(engine.probe(false), ProbeOutcome::Reprogrammed { .. }));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(800));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_Y), Some(600));
    }

    #[test]
    fn palette_mode_change_alone_reprograms() {
        let (mut engine, fpga) = make_engine();
        let mut input = mode_640x256_8mhz();
        input.bpp_field = 3;
        input.hdsr = 145;
        input.hder = Some(785);
        fpga.load_input(&input);
        engine.probe(false);

        input.extended = true;
        fpga.load_input(&input);
        assert!(matches!(engine.probe(false), ProbeOutcome::Reprogrammed { .. }));
    }

    #[test]
    fn doubled_mode_sets_line_double_flag() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_640x256_8mhz());

        engine.probe(false);

        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(640));
        assert_eq!(
            fpga.last_vo(regs::VIDO_REG_RES_Y),
            Some(512 | regs::VIDO_RES_DOUBLE)
        );
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_FP), Some(67));
    }

    #[test]
    fn hires_probe_programs_x4_pll() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_hires_288x896());

        let outcome = engine.probe(false);

        assert!(matches!(
            outcome,
            ProbeOutcome::Reprogrammed {
                classification: Classification::HighRes,
                ..
            }
        ));
        let (word, bits) = fpga.pll_capture();
        assert_eq!(bits, 26);
        assert_eq!(word as u32, PllConfigWord::for_class(MultiplierClass::X4).raw());
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(1152));
        let ctrl = fpga.last_vo(regs::VIDO_REG_CTRL).unwrap();
        assert_eq!(ctrl & regs::VIDO_CTRL_CURSOR_MASK, HIRES_CURSOR_OFFSET);
        assert_ne!(ctrl & regs::VIDO_CTRL_HIRES, 0);
        assert_eq!((ctrl >> regs::VIDO_CTRL_BPP_SHIFT) & 7, 0);
    }

    #[test]
    fn doubling_at_48mhz_programs_x2_pll() {
        let (mut engine, fpga) = make_engine();
        engine.init();
        fpga.load_input(&mode_640x256_24mhz());
        fpga.clear_pll_capture();

        let outcome = engine.probe(false);

        match outcome {
            ProbeOutcome::Reprogrammed {
                classification,
                mode,
            } => {
                assert_eq!(classification, Classification::Doubling { horizontal: false });
                assert_eq!(mode.multiplier, MultiplierClass::X2);
                assert_eq!(mode.timing.pixel_rate_mhz, 48);
            }
            other => panic!("expected a reprogram, got {:?}", other),
        }
        let (word, bits) = fpga.pll_capture();
        assert_eq!(bits, 26);
        assert_eq!(word as u32, PllConfigWord::for_class(MultiplierClass::X2).raw());
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(640));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_FP), Some(40));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_WIDTH), Some(20));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_HS_BP), Some(100));
        assert_eq!(
            fpga.last_vo(regs::VIDO_REG_RES_Y),
            Some(512 | regs::VIDO_RES_DOUBLE)
        );
        assert_eq!(engine.state().multiplier(), Some(MultiplierClass::X2));
    }

    #[test]
    fn pll_only_reprogrammed_when_multiplier_changes() {
        let (mut engine, fpga) = make_engine();
        engine.init();
        fpga.load_input(&mode_800x600());
        fpga.clear_pll_capture();

        engine.probe(false);
        assert_eq!(fpga.pll_capture().1, 0, "x1 already loaded at init");

        fpga.load_input(&mode_640x256_8mhz());
        engine.probe(false);
        assert_eq!(fpga.pll_capture().1, 0, "doubling at 24MHz is still x1");

        fpga.load_input(&mode_hires_288x896());
        engine.probe(false);
        assert_eq!(fpga.pll_capture().1, 26);
        assert_eq!(engine.state().multiplier(), Some(MultiplierClass::X4));
    }

    #[test]
    fn forced_probe_reprograms_everything() {
        let (mut engine, fpga) = make_engine();
        engine.init();
        fpga.load_input(&mode_800x600());
        engine.probe(false);
        fpga.clear_writes();
        fpga.clear_pll_capture();

        assert!(matches!(engine.probe(true), ProbeOutcome::Reprogrammed { .. }));
        assert_eq!(fpga.timing_writes().len(), 10);
        assert_eq!(fpga.pll_capture().1, 26);
    }

    #[test]
    fn probe_returns_without_flyback_or_ack() {
        let (mut engine, fpga) = make_engine();
        fpga.set_flyback_toggles(false);
        fpga.set_ack_follows_request(false);
        fpga.load_input(&mode_800x600());

        assert!(matches!(engine.probe(false), ProbeOutcome::Reprogrammed { .. }));
        assert_eq!(fpga.writes_to(regs::vo(regs::VIDO_REG_SYNC)).len(), 1);
    }

    #[test]
    fn probe_survives_garbage_registers() {
        let (mut engine, fpga) = make_engine();
        for byte_addr in (0..0x100u32).step_by(4) {
            fpga.set(regs::vidc(byte_addr), 0xFFFF_FFFF);
        }
        let _ = engine.probe(false);

        fpga.set(regs::vidc(regs::VIDC_H_DISP_START), 1000 << 14);
        fpga.set(regs::vidc(regs::VIDC_H_DISP_END), 3 << 14);
        fpga.set(regs::vidc(regs::VIDC_V_DISP_START), 2 << 14);
        fpga.set(regs::vidc(regs::VIDC_V_DISP_END), 100 << 14);
        let _ = engine.probe(false);
    }
}

// ============================================================================
// Manual control and reconfiguration polling
// ============================================================================

mod control_tests {
    use super::*;

    #[test]
    fn preset_programs_registers_and_invalidates_probe_state() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_800x600());
        engine.probe(false);

        assert!(engine.set_mode_number(28));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_RES_X), Some(640));
        assert_eq!(fpga.last_vo(regs::VIDO_REG_CTRL), Some(137 | (3 << 28)));
        assert_eq!(engine.state().mode(), None);

        assert!(matches!(engine.probe(false), ProbeOutcome::Reprogrammed { .. }));
    }

    #[test]
    fn hicolour_depth_on_any_preset_family() {
        let (mut engine, fpga) = make_engine();
        engine.set_mode(Preset::Vga640x480 {
            depth: Depth::Bpp16,
        });

        assert_eq!(fpga.last_vo(regs::VIDO_REG_WPLM1), Some(640 / 2 - 1));
        let ctrl = fpga.last_vo(regs::VIDO_REG_CTRL).unwrap();
        assert_ne!(ctrl & regs::VIDO_CTRL_EXT_PALETTE, 0);
    }

    #[test]
    fn unknown_preset_writes_nothing() {
        let (mut engine, fpga) = make_engine();
        assert!(!engine.set_mode_number(2));
        assert!(fpga.writes().is_empty());
    }

    #[test]
    fn cursor_offset_preserves_control_bits() {
        let (mut engine, fpga) = make_engine();
        fpga.set(regs::vo(regs::VIDO_REG_CTRL), regs::VIDO_CTRL_HIRES | (2 << 28) | 0x123);

        engine.set_cursor_x(0xFFFF);

        assert_eq!(
            fpga.last_vo(regs::VIDO_REG_CTRL),
            Some(regs::VIDO_CTRL_HIRES | (2 << 28) | 0x7FF)
        );
    }

    #[test]
    fn manual_timing_writes_registers() {
        let (mut engine, fpga) = make_engine();
        engine.set_x_timing(640, 16, 96, 48, 79);
        engine.set_y_timing(480, 10, 2, 33);

        let expected: Vec<(u32, u32)> = [
            (regs::VIDO_REG_RES_X, 640),
            (regs::VIDO_REG_HS_FP, 16),
            (regs::VIDO_REG_HS_WIDTH, 96),
            (regs::VIDO_REG_HS_BP, 48),
            (regs::VIDO_REG_WPLM1, 79),
            (regs::VIDO_REG_RES_Y, 480),
            (regs::VIDO_REG_VS_FP, 10),
            (regs::VIDO_REG_VS_WIDTH, 2),
            (regs::VIDO_REG_VS_BP, 33),
        ]
        .iter()
        .map(|&(i, v)| (regs::vo(i), v))
        .collect();
        assert_eq!(fpga.writes(), expected);
    }

    #[test]
    fn reconfig_event_triggers_probe() {
        let (mut engine, fpga) = make_engine();
        fpga.load_input(&mode_800x600());
        let sync = regs::vo(regs::VIDO_REG_SYNC);

        assert_eq!(engine.poll_reconfig(), None, "no event pending");

        fpga.set(sync, regs::VIDO_SYNC_RECONFIG);
        let outcome = engine.poll_reconfig();

        assert!(matches!(outcome, Some(ProbeOutcome::Reprogrammed { .. })));
        let acks = fpga.writes_to(sync);
        assert_eq!(
            acks[0] & !regs::VIDO_SYNC_FLYBACK,
            regs::VIDO_SYNC_RECONFIG | regs::VIDO_SYNC_RECONFIG_ACK
        );
    }

    #[test]
    fn reconfig_without_autoprobe_only_acks() {
        let (mut engine, fpga) = make_engine();
        engine.set_autoprobe(false);
        fpga.load_input(&mode_800x600());
        fpga.set(regs::vo(regs::VIDO_REG_SYNC), regs::VIDO_SYNC_RECONFIG);

        assert_eq!(engine.poll_reconfig(), None);
        assert!(fpga.timing_writes().is_empty());
        assert_eq!(fpga.writes_to(regs::vo(regs::VIDO_REG_SYNC)).len(), 1);
        assert_eq!(engine.poll_reconfig(), None, "ack now matches status");
    }
}
