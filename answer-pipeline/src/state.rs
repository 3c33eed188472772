use state_machines::state_machine;

state_machine! {
    name: QueryMachine,
    state: QueryState,
    initial: Idle,
    states: [Idle, FetchingContext, Generating, Responding],
    events {
        receive { transition: { from: Idle, to: FetchingContext } }
        generate { transition: { from: FetchingContext, to: Generating } }
        respond {
            transition: { from: FetchingContext, to: Responding }
            transition: { from: Generating, to: Responding }
        }
    }
}

pub fn idle() -> QueryMachine<(), Idle> {
    QueryMachine::new(())
}
