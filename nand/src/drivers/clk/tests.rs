//! Tests for fixed-clock lookup

use super::*;
use crate::drivers::dtb::Fdt;
use crate::testing::{denali_board_dtb, FdtBuilder};

fn nand_node<'a>(fdt: &Fdt<'a>) -> crate::drivers::dtb::FdtNode<'a> {
    fdt.find_compatible("altr,socfpga-denali-nand").next().unwrap()
}

#[test]
fn test_fixed_clock_rate() {
    let blob = denali_board_dtb("altr,socfpga-denali-nand", &["control", "data"]);
    let fdt = Fdt::new(&blob).unwrap();
    let dev = nand_node(&fdt);
    let mut clocks = FixedClocks::new(fdt);

    let clk = clocks.get_clock(&dev, 0).unwrap();
    assert_eq!(clk, ClockHandle { provider: 7, id: 0 });
    assert!(clocks.enable(&clk).is_ok());
    assert_eq!(clocks.rate_hz(&clk), 50_000_000);
}

#[test]
fn test_clock_index_out_of_range() {
    let blob = denali_board_dtb("altr,socfpga-denali-nand", &["control", "data"]);
    let fdt = Fdt::new(&blob).unwrap();
    let dev = nand_node(&fdt);
    let mut clocks = FixedClocks::new(fdt);

    assert_eq!(clocks.get_clock(&dev, 1), Err(ClockError::NotFound));
}

#[test]
fn test_specifier_args_are_skipped() {
    // clocks = <&gate 3>, <&osc>; the gate provider has #clock-cells = <1>
    let mut b = FdtBuilder::new();
    b.begin_node("")
        .begin_node("gate")
        .prop_strs("compatible", &["vendor,clk-gate"])
        .prop_u32("#clock-cells", 1)
        .prop_u32("phandle", 1)
        .end_node()
        .begin_node("osc")
        .prop_strs("compatible", &["fixed-clock"])
        .prop_u32("#clock-cells", 0)
        .prop_cells("clock-frequency", &[0, 200_000_000])
        .prop_u32("phandle", 2)
        .end_node()
        .begin_node("nand")
        .prop_strs("compatible", &["socionext,uniphier-denali-nand-v5a"])
        .prop_cells("clocks", &[1, 3, 2])
        .end_node()
        .end_node();
    let blob = b.finish();
    let fdt = Fdt::new(&blob).unwrap();
    let dev = fdt.find_compatible("socionext,uniphier-denali-nand-v5a").next().unwrap();
    let mut clocks = FixedClocks::new(fdt);

    // first clock comes from a provider we cannot drive
    assert_eq!(clocks.get_clock(&dev, 0), Err(ClockError::NotFound));

    let clk = clocks.get_clock(&dev, 1).unwrap();
    assert_eq!(clk.provider, 2);
    assert_eq!(clocks.rate_hz(&clk), 200_000_000);
}

#[test]
fn test_device_without_clocks() {
    let mut b = FdtBuilder::new();
    b.begin_node("")
        .begin_node("nand")
        .prop_strs("compatible", &["altr,socfpga-denali-nand"])
        .end_node()
        .end_node();
    let blob = b.finish();
    let fdt = Fdt::new(&blob).unwrap();
    let dev = nand_node(&fdt);
    let mut clocks = FixedClocks::new(fdt);

    assert_eq!(clocks.get_clock(&dev, 0), Err(ClockError::NotFound));
}

#[test]
fn test_enable_unknown_provider_fails() {
    let blob = denali_board_dtb("altr,socfpga-denali-nand", &["control", "data"]);
    let fdt = Fdt::new(&blob).unwrap();
    let mut clocks = FixedClocks::new(fdt);

    let bogus = ClockHandle { provider: 99, id: 0 };
    assert_eq!(clocks.enable(&bogus), Err(EnableFailed));
    assert_eq!(clocks.rate_hz(&bogus), 0);
}
