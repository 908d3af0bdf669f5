fn main() -> anyhow::Result<()> {
    marksheet_lib::run()
}
