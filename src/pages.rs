use std::fmt;

use chrono::NaiveDate;
use log::info;
use rand::Rng;
use rust_decimal::Decimal;

use crate::dating::{self, DateRange};
use crate::error::InvoiceError;
use crate::numbering::{
    ControlNumber, ControlNumbers, InvoiceNumbers, MAX_PAGES,
};
use crate::products::Product;

/// Parameters collected from the operator for one run.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Numbering {
    pub invoice_start: u32,
    pub control_start: ControlNumber,
    pub range: DateRange,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Page {
    pub position: usize,
    pub number: u32,
    pub control: ControlNumber,
    pub date: NaiveDate,
    pub expires: NaiveDate,
    pub items: Vec<Product>,
}

impl Page {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|i| i.total).sum()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invoice: #{}\n\
             Control: {}\n\
             Date: {}\n\
             Expires: {}\n\n",
            self.number,
            self.control,
            self.date.format("%d/%m/%Y"),
            self.expires.format("%d/%m/%Y"),
        )?;

        for item in self.items.iter() {
            writeln!(f, "{}", item)?;
        }

        write!(f, "\nSubtotal: {:.2}", self.subtotal())
    }
}

/// Splits products into consecutive pages of at most `per_page` items.
pub fn paginate(
    products: &[Product],
    per_page: usize,
) -> Result<Vec<&[Product]>, InvoiceError> {
    if per_page == 0 {
        return Err(InvoiceError::EmptyPageLayout);
    }
    if products.is_empty() {
        return Err(InvoiceError::NoProducts);
    }
    let pages = products.len().div_ceil(per_page);
    if pages > MAX_PAGES {
        return Err(InvoiceError::TooManyPages {
            items: products.len(),
            pages,
            max: MAX_PAGES,
        });
    }
    Ok(products.chunks(per_page).collect())
}

pub fn build_pages<R: Rng + ?Sized>(
    products: &[Product],
    per_page: usize,
    numbering: &Numbering,
    rng: &mut R,
) -> Result<Vec<Page>, InvoiceError> {
    let chunks = paginate(products, per_page)?;
    let dates =
        dating::invoice_dates(&numbering.range, chunks.len(), &mut *rng)?;
    let mut invoices = InvoiceNumbers::new(numbering.invoice_start)?;
    let mut controls = ControlNumbers::new(numbering.control_start);

    let pages = chunks
        .into_iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (items, date))| {
            Ok(Page {
                position: i + 1,
                number: invoices.issue()?,
                control: controls.issue(date, &mut *rng)?,
                date,
                expires: dating::expiration(date)?,
                items: items.to_vec(),
            })
        })
        .collect::<Result<Vec<Page>, InvoiceError>>()?;

    info!(
        "Built {} page(s) for {} product(s), invoices {}..={}",
        pages.len(),
        products.len(),
        numbering.invoice_start,
        numbering.invoice_start as usize + pages.len() - 1
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::tests::ymd;
    use crate::calendar::Weekdays;
    use crate::products::tests::product;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn products(count: usize) -> Vec<Product> {
        (0..count).map(product).collect()
    }

    fn numbering() -> Numbering {
        Numbering {
            invoice_start: 100,
            control_start: ControlNumber::new(968).unwrap(),
            range: DateRange::new(ymd(2026, 1, 19), ymd(2026, 1, 30))
                .unwrap(),
        }
    }

    #[test]
    fn last_page_may_be_short() {
        let items = products(20);
        let pages = paginate(&items, 9).unwrap();
        let sizes: Vec<usize> = pages.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![9, 9, 2]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(paginate(&[], 9), Err(InvoiceError::NoProducts));
    }

    #[test]
    fn zero_sized_pages_are_an_error() {
        assert_eq!(
            paginate(&products(1), 0),
            Err(InvoiceError::EmptyPageLayout)
        );
    }

    #[test]
    fn capacity_is_fifty_pages() {
        assert_eq!(paginate(&products(450), 9).unwrap().len(), 50);
        assert_eq!(
            paginate(&products(451), 9),
            Err(InvoiceError::TooManyPages {
                items: 451,
                pages: 51,
                max: MAX_PAGES,
            })
        );
    }

    #[test]
    fn pages_carry_numbering_and_dates() {
        let mut rng = StdRng::seed_from_u64(42);
        let pages =
            build_pages(&products(27), 9, &numbering(), &mut rng).unwrap();

        assert_eq!(pages.len(), 3);
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![100, 101, 102]);
        assert_eq!(pages[0].control.to_string(), "000968");

        for pair in pages.windows(2) {
            assert!(pair[0].date <= pair[1].date);
            assert!(pair[0].control < pair[1].control);
        }
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.position, i + 1);
            assert!(page.date.is_weekday());
            assert!(page.expires.is_weekday());
            assert_eq!(page.expires, dating::expiration(page.date).unwrap());
            assert_eq!(page.items.len(), 9);
        }
    }

    #[test]
    fn page_display() {
        let page = Page {
            position: 1,
            number: 804,
            control: ControlNumber::new(968).unwrap(),
            date: ymd(2026, 1, 21),
            expires: ymd(2026, 2, 20),
            items: vec![product(1), product(2)],
        };
        assert_eq!(page.subtotal(), dec!(41.00));
        assert_eq!(
            page.to_string(),
            "Invoice: #804\n\
             Control: 000968\n\
             Date: 21/01/2026\n\
             Expires: 20/02/2026\n\n\
             [P-001] Repuesto 1, 2 @ 10.25: 20.50\n\
             [P-002] Repuesto 2, 2 @ 10.25: 20.50\n\
             \nSubtotal: 41.00"
        );
    }

    proptest! {
        #[test]
        fn pages_reassemble_the_input(count in 1usize..=450) {
            let items = products(count);
            let pages = paginate(&items, 9).unwrap();

            prop_assert!(pages.iter().all(|p| !p.is_empty() && p.len() <= 9));
            prop_assert_eq!(pages.len(), count.div_ceil(9));
            let joined: Vec<Product> =
                pages.iter().flat_map(|p| p.iter().cloned()).collect();
            prop_assert_eq!(joined, items);
        }
    }
}
