fn main() {
    minemonitor::main();
}
