pub mod lnbits;
