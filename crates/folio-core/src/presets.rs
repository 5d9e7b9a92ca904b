//! # Preset Definition Sets
//!
//! Ready-made document types used by the hosts and the test-suite.
//!
//! ## GST Invoice
//! ```text
//! GROSS        = unit_price × quantity
//! DISCOUNT     = discount_percent% of GROSS
//! TAXABLE      = GROSS − DISCOUNT
//! GST          = rate_value% of TAXABLE ──► CGST + SGST (intra) | IGST (inter)
//! ADDL_DISCOUNT= ADDITIONAL_DISCOUNT_PERCENT% of TAXABLE
//! TOTAL_AMOUNT = TAXABLE + GST                              (per line)
//! GRAND_TOTAL  = TAXABLE + GST − ADDL_DISCOUNT              (document)
//!                − ADDITIONAL_DISCOUNT_AMOUNT               (once)
//! ```
//!
//! The additional discount is a percentage, a fixed amount, or both; an
//! absent amount scalar means no fixed discount.
//!
//! ## Salary Template
//! ```text
//! BASIC             = 50% of CTC
//! HRA               = 40% of BASIC
//! EMPLOYER_PF       = 12% of BASIC
//! SPECIAL_ALLOWANCE = CTC − BASIC − HRA − EMPLOYER_PF
//! EMPLOYEE_PF       = 12% of BASIC
//! PROFESSIONAL_TAX  = 2400 (flat, annual)
//! NET_PAY           = GROSS_EARNINGS − TOTAL_DEDUCTIONS
//! ```

use std::collections::BTreeSet;

use crate::definitions::{BalanceCheck, DefinitionDraft, DefinitionSet};
use crate::error::CoreResult;
use crate::types::{ComponentDefinition, ComponentKind, LineField, Rate};

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &[GST_INVOICE, SALARY_TEMPLATE];

pub const GST_INVOICE: &str = "gst_invoice";
pub const SALARY_TEMPLATE: &str = "salary_template";

/// Scalar read by the GST invoice's document-level discount.
pub const ADDITIONAL_DISCOUNT_PERCENT: &str = "ADDITIONAL_DISCOUNT_PERCENT";

/// Fixed amount taken off the GST invoice's grand total.
pub const ADDITIONAL_DISCOUNT_AMOUNT: &str = "ADDITIONAL_DISCOUNT_AMOUNT";

/// Looks up a preset by name. `None` for unknown names.
pub fn preset(name: &str) -> Option<CoreResult<DefinitionSet>> {
    match name {
        GST_INVOICE => Some(gst_invoice()),
        SALARY_TEMPLATE => Some(salary_template()),
        _ => None,
    }
}

/// Invoice / purchase-order lines with item discount, GST and an optional
/// document-level additional discount.
pub fn gst_invoice() -> CoreResult<DefinitionSet> {
    use ComponentKind::*;

    let definitions = vec![
        ComponentDefinition::line_value("GROSS", Charge, LineField::UnitPrice)
            .quantity_scaled()
            .labelled("Gross Amount"),
        ComponentDefinition::percentage(
            "DISCOUNT",
            Discount,
            Rate::Line(LineField::DiscountPercent),
            "GROSS",
        )
        .labelled("Item Discount"),
        ComponentDefinition::sum("TAXABLE", Charge, &["GROSS"], &["DISCOUNT"])
            .labelled("Taxable Amount"),
        ComponentDefinition::percentage("GST", Tax, Rate::Line(LineField::RateValue), "TAXABLE")
            .with_split(&["CGST", "SGST"], Some("IGST"))
            .labelled("GST"),
        ComponentDefinition::percentage(
            "ADDL_DISCOUNT",
            Discount,
            Rate::Scalar(ADDITIONAL_DISCOUNT_PERCENT.to_string()),
            "TAXABLE",
        )
        .labelled("Additional Discount"),
        ComponentDefinition::sum("TOTAL_AMOUNT", Total, &["TAXABLE", "GST"], &[])
            .labelled("Total Amount"),
        ComponentDefinition::sum("SUBTOTAL", Total, &["GROSS"], &[]).labelled("Subtotal"),
        ComponentDefinition::sum("TOTAL_DISCOUNT", Total, &["DISCOUNT", "ADDL_DISCOUNT"], &[])
            .labelled("Total Discount"),
        ComponentDefinition::sum("TOTAL_ADDL_DISCOUNT", Total, &["ADDL_DISCOUNT"], &[])
            .labelled("Additional Discount"),
        ComponentDefinition::sum("TOTAL_TAXABLE", Total, &["TAXABLE"], &[])
            .labelled("Taxable Amount"),
        ComponentDefinition::sum("TOTAL_CGST", Total, &["CGST"], &[]).labelled("CGST"),
        ComponentDefinition::sum("TOTAL_SGST", Total, &["SGST"], &[]).labelled("SGST"),
        ComponentDefinition::sum("TOTAL_IGST", Total, &["IGST"], &[]).labelled("IGST"),
        ComponentDefinition::sum("TOTAL_TAX", Total, &["GST"], &[]).labelled("Total Tax"),
        ComponentDefinition::sum("GRAND_TOTAL", Total, &["TAXABLE", "GST"], &["ADDL_DISCOUNT"])
            .labelled("Grand Total"),
    ];

    DefinitionSet::build(DefinitionDraft {
        name: GST_INVOICE.to_string(),
        definitions,
        scalars: BTreeSet::from([
            ADDITIONAL_DISCOUNT_PERCENT.to_string(),
            ADDITIONAL_DISCOUNT_AMOUNT.to_string(),
        ]),
        grand_total: Some("GRAND_TOTAL".to_string()),
        balance: Some(BalanceCheck {
            taxable: vec!["TAXABLE".to_string()],
            taxes: vec!["GST".to_string()],
            charges: Vec::new(),
            discounts: vec!["ADDL_DISCOUNT".to_string()],
        }),
        document_discount: Some(ADDITIONAL_DISCOUNT_AMOUNT.to_string()),
    })
}

/// Annual CTC breakdown. Evaluated as a single unit line; only the `CTC`
/// scalar drives it.
pub fn salary_template() -> CoreResult<DefinitionSet> {
    use ComponentKind::*;

    let definitions = vec![
        ComponentDefinition::percentage("BASIC", Earning, Rate::Fixed(50.0), "CTC")
            .labelled("Basic Salary"),
        ComponentDefinition::percentage("HRA", Earning, Rate::Fixed(40.0), "BASIC")
            .labelled("House Rent Allowance"),
        ComponentDefinition::percentage("EMPLOYER_PF", Charge, Rate::Fixed(12.0), "BASIC")
            .labelled("Employer PF"),
        ComponentDefinition::sum(
            "SPECIAL_ALLOWANCE",
            Earning,
            &["CTC"],
            &["BASIC", "HRA", "EMPLOYER_PF"],
        )
        .labelled("Special Allowance"),
        ComponentDefinition::percentage("EMPLOYEE_PF", Deduction, Rate::Fixed(12.0), "BASIC")
            .labelled("Employee PF"),
        ComponentDefinition::flat("PROFESSIONAL_TAX", Tax, 2400.0).labelled("Professional Tax"),
        ComponentDefinition::sum(
            "GROSS_EARNINGS",
            Total,
            &["BASIC", "HRA", "SPECIAL_ALLOWANCE"],
            &[],
        )
        .labelled("Gross Earnings"),
        ComponentDefinition::sum(
            "TOTAL_DEDUCTIONS",
            Total,
            &["EMPLOYEE_PF", "PROFESSIONAL_TAX"],
            &[],
        )
        .labelled("Total Deductions"),
        ComponentDefinition::sum("NET_PAY", Total, &["GROSS_EARNINGS"], &["TOTAL_DEDUCTIONS"])
            .labelled("Net Pay"),
    ];

    DefinitionSet::build(DefinitionDraft {
        name: SALARY_TEMPLATE.to_string(),
        definitions,
        scalars: BTreeSet::new(),
        grand_total: Some("NET_PAY".to_string()),
        balance: None,
        document_discount: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        for name in PRESET_NAMES {
            let set = preset(name).unwrap().unwrap();
            assert_eq!(set.name(), *name);
        }
        assert!(preset("payroll_v0").is_none());
    }

    #[test]
    fn test_gst_invoice_order() {
        let set = gst_invoice().unwrap();
        let order = set.order();
        let pos = |code: &str| order.iter().position(|c| *c == code).unwrap();
        assert!(pos("GROSS") < pos("DISCOUNT"));
        assert!(pos("DISCOUNT") < pos("TAXABLE"));
        assert!(pos("TAXABLE") < pos("GST"));
        assert!(pos("GST") < pos("TOTAL_CGST"));
        assert!(pos("ADDL_DISCOUNT") < pos("GRAND_TOTAL"));
        assert!(set.depends_on_scalar(ADDITIONAL_DISCOUNT_PERCENT));
        assert!(!set.depends_on_scalar(ADDITIONAL_DISCOUNT_AMOUNT));
        assert_eq!(set.document_discount(), Some(ADDITIONAL_DISCOUNT_AMOUNT));
    }

    #[test]
    fn test_salary_reads_only_ctc() {
        let set = salary_template().unwrap();
        let deps: Vec<&str> = set.scalar_dependencies().iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["CTC"]);
        assert_eq!(set.grand_total(), Some("NET_PAY"));
    }
}
