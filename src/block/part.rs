/// A named part of a converted model that contributes symbols to the global namespace
pub trait Part {
    /// Block identifier
    fn name(&self) -> &str;

    /// All identifiers contributed by this part, in declaration order
    fn symbol_ids(&self) -> Vec<&str>;

    /// Check if this part declares `symbol`
    fn contains_symbol(&self, symbol: &str) -> bool {
        self.symbol_ids().contains(&symbol)
    }
}
