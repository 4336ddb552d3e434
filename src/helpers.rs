/// location string for error contexts so a failure deep in the bit loops
/// can be traced back without a debugger
macro_rules! here {
    () => {
        concat!("at ", file!(), ":", line!())
    };
}

pub(crate) use here;
